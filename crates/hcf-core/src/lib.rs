// hcf-core - Data model and wire codec for the Hubstorage Crawl Frontier
//
// Everything here is pure data: destinations, links, the newline-delimited
// JSON bodies exchanged with the frontier, and the response shape handed back
// by whichever transport the host uses.

pub mod codec;
pub mod error;
pub mod response;
pub mod types;

pub use codec::{BatchId, FetchedBatch};
pub use error::{Error, Result};
pub use response::HttpResponse;
pub use types::{Destination, Link, QueuedLink};

//! Async host for the Hubstorage Crawl Frontier coordinator
//!
//! The coordinator in [`hcf_frontier`] only decides what to send; this crate
//! supplies the transport ([`HttpClient`]) and the event loop ([`Driver`])
//! that executes its operations and feeds completions back.

pub mod driver;
pub mod http;
pub mod init;

pub use driver::{Driver, RunSummary};
pub use http::{HttpClient, ReqwestHttpClient};

pub use hcf_config::HcfConfig;
pub use hcf_core::{Destination, HttpResponse, Link, QueuedLink};
pub use hcf_frontier::{Frontier, LinkConsumer, Operation};

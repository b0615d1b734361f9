//! Idle-driven coordinator for the Hubstorage Crawl Frontier
//!
//! The [`Frontier`] decides, each time the host reports it has nothing else to
//! do, which single class of remote operation to issue next: acknowledge the
//! last fetched batches, fetch more links, flush buffered links, or schedule a
//! follow-up job. It never performs I/O itself; it returns [`Operation`]
//! descriptors and expects the host to report their completion.

pub mod consumer;
pub mod cursor;
pub mod error;
pub mod request;
pub mod scheduler;
pub mod settings;
pub mod trigger;

pub use consumer::LinkConsumer;
pub use cursor::ReadCursor;
pub use error::{FrontierError, Result};
pub use request::{
    authenticate, url_component_join, Category, Completion, Credentials, Method, Operation,
    RequestBuilder,
};
pub use scheduler::{CompletionOutcome, Frontier, IdleDecision};
pub use settings::{Settings, MAX_BATCH_SIZE};
pub use trigger::FollowUpTrigger;

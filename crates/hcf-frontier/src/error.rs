use thiserror::Error;

/// Errors raised by the frontier coordinator
#[derive(Debug, Error)]
pub enum FrontierError {
    /// Links were requested but there is no slot to read them from
    #[error("{0} links requested but no read destination (consume_from) is configured")]
    MissingReadDestination(u64),

    #[error("project id must not be empty")]
    MissingProjectId,

    #[error("start_new_job requires a spider name")]
    MissingSpider,

    #[error("slot buffer size must be greater than 0")]
    InvalidCapacity,

    #[error("fetch batch size must be greater than 0")]
    InvalidBatchSize,

    /// Encoding or decoding a frontier payload failed
    #[error(transparent)]
    Core(#[from] hcf_core::Error),
}

pub type Result<T> = std::result::Result<T, FrontierError>;

use hcf_core::Destination;

/// Upper bound the frontier enforces on a single read.
pub const MAX_BATCH_SIZE: u64 = 10_000;

pub const DEFAULT_ENDPOINT: &str = "http://storage.scrapinghub.com/";
pub const DEFAULT_SCHEDULE_URL: &str = "https://dash.scrapinghub.com/api/schedule.json";

/// Everything a [`Frontier`](crate::Frontier) session needs to know.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Total links to read over the session
    pub links_to_fetch: u64,
    /// Links requested per fetch; capped at [`MAX_BATCH_SIZE`]
    pub batch_size: u64,
    /// Slot links are read from and acknowledged in
    pub consume_from: Option<Destination>,
    /// Links buffered per slot before an add is sent
    pub slot_buffer_size: usize,
    /// Schedule one more run of the spider once everything is flushed
    pub start_new_job: bool,
    /// Never delete; read a single batch at most
    pub debug_mode: bool,
    pub endpoint: String,
    pub project_id: String,
    /// API key, sent as the basic auth user
    pub auth: Option<String>,
    pub schedule_url: String,
    /// Spider to schedule when `start_new_job` is set
    pub spider: Option<String>,
}

impl Settings {
    pub fn effective_batch_size(&self) -> u64 {
        self.batch_size.min(MAX_BATCH_SIZE)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            links_to_fetch: 0,
            batch_size: 1000,
            consume_from: None,
            slot_buffer_size: 4096,
            start_new_job: false,
            debug_mode: false,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            project_id: String::new(),
            auth: None,
            schedule_url: DEFAULT_SCHEDULE_URL.to_string(),
            spider: None,
        }
    }
}

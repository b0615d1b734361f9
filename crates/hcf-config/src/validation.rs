// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{bail, Context, Result};
use hcf_frontier::MAX_BATCH_SIZE;
use tracing::warn;

pub fn validate_config(config: &HcfConfig) -> Result<()> {
    validate_hubstorage_config(&config.hubstorage)?;
    validate_fetch_config(&config.fetch)?;

    if config.write.slot_buffer_size == 0 {
        bail!("write.slot_buffer_size must be greater than 0");
    }

    if config.job.start_new_job && config.job.spider.as_deref().unwrap_or("").is_empty() {
        bail!("job.spider is required when job.start_new_job is enabled");
    }

    if config.driver.max_failed_rounds == 0 {
        bail!("driver.max_failed_rounds must be greater than 0");
    }

    Ok(())
}

fn validate_hubstorage_config(config: &HubstorageConfig) -> Result<()> {
    if config.project_id.is_empty() {
        bail!("hubstorage.project_id is required");
    }

    url::Url::parse(&config.endpoint)
        .with_context(|| format!("hubstorage.endpoint is not a valid URL: {}", config.endpoint))?;
    url::Url::parse(&config.schedule_url).with_context(|| {
        format!(
            "hubstorage.schedule_url is not a valid URL: {}",
            config.schedule_url
        )
    })?;

    if config.auth.is_none() {
        warn!("hubstorage.auth is not set; requests will be sent unauthenticated");
    }

    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<()> {
    if config.batch_size == 0 {
        bail!("fetch.batch_size must be greater than 0");
    }

    if config.batch_size > MAX_BATCH_SIZE {
        warn!(
            batch_size = config.batch_size,
            max = MAX_BATCH_SIZE,
            "fetch.batch_size exceeds the frontier limit; it will be capped"
        );
    }

    if config.links_to_fetch > 0 && config.consume_from.is_none() {
        bail!("fetch.consume_from is required when fetch.links_to_fetch is greater than 0");
    }

    Ok(())
}

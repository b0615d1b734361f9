use super::{HcfConfig, LogFormat};
use anyhow::{anyhow, Context, Result};
use hcf_core::Destination;

pub const ENV_PREFIX: &str = "HCF_";

/// Abstraction over environment-variable lookups so tests can supply
/// overrides from a map instead of the process environment.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the HCF_ prefix
    /// Used for the platform-wide SH_APIKEY
    fn get_raw(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides on top of file/default values.
pub fn apply_env_overrides<E: EnvSource>(config: &mut HcfConfig, env: &E) -> Result<()> {
    // Hubstorage
    if let Some(endpoint) = get_env_string(env, "ENDPOINT") {
        config.hubstorage.endpoint = endpoint;
    }
    if let Some(project_id) = get_env_string(env, "PROJECT_ID") {
        config.hubstorage.project_id = project_id;
    }
    // HCF_AUTH wins over the shared SH_APIKEY
    if let Some(auth) = get_env_string(env, "AUTH") {
        config.hubstorage.auth = Some(auth);
    } else if let Some(auth) = env.get_raw("SH_APIKEY").filter(|k| !k.is_empty()) {
        config.hubstorage.auth = Some(auth);
    }
    if let Some(url) = get_env_string(env, "SCHEDULE_URL") {
        config.hubstorage.schedule_url = url;
    }

    // Fetch
    if let Some(val) = get_env_u64(env, "LINKS_TO_FETCH")? {
        config.fetch.links_to_fetch = val;
    }
    if let Some(val) = get_env_u64(env, "BATCH_SIZE")? {
        config.fetch.batch_size = val;
    }
    if let Some(dest) = get_env_string(env, "CONSUME_FROM") {
        let parsed = dest
            .parse::<Destination>()
            .with_context(|| format!("Invalid {}CONSUME_FROM value", ENV_PREFIX))?;
        config.fetch.consume_from = Some(parsed);
    }

    // Write
    if let Some(val) = get_env_usize(env, "SLOT_BUFFER_SIZE")? {
        config.write.slot_buffer_size = val;
    }

    // Job
    if let Some(val) = get_env_bool(env, "START_NEW_JOB")? {
        config.job.start_new_job = val;
    }
    if let Some(spider) = get_env_string(env, "SPIDER") {
        config.job.spider = Some(spider);
    }

    if let Some(val) = get_env_bool(env, "DEBUG_MODE")? {
        config.debug_mode = val;
    }

    // Logging
    if let Some(level) = get_env_string(env, "LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT") {
        config.logging.format = format
            .parse::<LogFormat>()
            .with_context(|| format!("Invalid {}LOG_FORMAT value", ENV_PREFIX))?;
    }

    if let Some(val) = get_env_u32(env, "MAX_FAILED_ROUNDS")? {
        config.driver.max_failed_rounds = val;
    }

    Ok(())
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get(key)
}

fn get_env_usize<E: EnvSource>(env: &E, key: &str) -> Result<Option<usize>> {
    match get_env_string(env, key) {
        Some(val) => {
            let parsed = val
                .parse::<usize>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn get_env_u64<E: EnvSource>(env: &E, key: &str) -> Result<Option<u64>> {
    match get_env_string(env, key) {
        Some(val) => {
            let parsed = val
                .parse::<u64>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn get_env_u32<E: EnvSource>(env: &E, key: &str) -> Result<Option<u32>> {
    match get_env_string(env, key) {
        Some(val) => {
            let parsed = val
                .parse::<u32>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn get_env_bool<E: EnvSource>(env: &E, key: &str) -> Result<Option<bool>> {
    match get_env_string(env, key) {
        Some(val) => {
            let parsed = match val.to_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                other => {
                    return Err(anyhow!(
                        "Failed to parse {}{} (expected bool): {}",
                        ENV_PREFIX,
                        key,
                        other
                    ))
                }
            };
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

// hcf-config - Configuration for frontier sessions
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority)
// 2. Config file path from HCF_CONFIG env var
// 3. Config file contents from HCF_CONFIG_CONTENT env var
// 4. Default config file locations (./hcf.toml, ./.hcf.toml)
// 5. Built-in defaults (lowest priority)
//
// Command-line flags sit above all of these and are applied by the binary.

use anyhow::Result;
use hcf_core::Destination;
use hcf_frontier::settings::{DEFAULT_ENDPOINT, DEFAULT_SCHEDULE_URL};
use hcf_frontier::Settings;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{apply_env_overrides, EnvSource, ENV_PREFIX};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HcfConfig {
    /// Never delete from the frontier and read at most one batch
    #[serde(default)]
    pub debug_mode: bool,

    #[serde(default)]
    pub hubstorage: HubstorageConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub write: WriteConfig,

    #[serde(default)]
    pub job: JobConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub driver: DriverConfig,
}

/// Where the frontier lives and how to authenticate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubstorageConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    #[serde(default = "default_schedule_url")]
    pub schedule_url: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_schedule_url() -> String {
    DEFAULT_SCHEDULE_URL.to_string()
}

impl Default for HubstorageConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            project_id: String::new(),
            auth: None,
            schedule_url: default_schedule_url(),
        }
    }
}

/// Read side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default)]
    pub links_to_fetch: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consume_from: Option<Destination>,
}

fn default_batch_size() -> u64 {
    1000
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            links_to_fetch: 0,
            batch_size: default_batch_size(),
            consume_from: None,
        }
    }
}

/// Write side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteConfig {
    #[serde(default = "default_slot_buffer_size")]
    pub slot_buffer_size: usize,
}

fn default_slot_buffer_size() -> usize {
    4096
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            slot_buffer_size: default_slot_buffer_size(),
        }
    }
}

/// Follow-up job scheduling
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub start_new_job: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spider: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

/// Host event loop limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Consecutive rounds with failed operations before giving up
    #[serde(default = "default_max_failed_rounds")]
    pub max_failed_rounds: u32,
}

fn default_max_failed_rounds() -> u32 {
    5
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            max_failed_rounds: default_max_failed_rounds(),
        }
    }
}

impl HcfConfig {
    /// Load configuration from default locations and the process environment
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Load from an explicit file (CLI `--config`), then apply environment overrides
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Like [`HcfConfig::load`] but tolerates unreadable default files
    pub fn load_or_default() -> Result<Self> {
        sources::load_or_default()
    }

    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Session settings for [`hcf_frontier::Frontier::new`]
    pub fn frontier_settings(&self) -> Settings {
        Settings {
            links_to_fetch: self.fetch.links_to_fetch,
            batch_size: self.fetch.batch_size,
            consume_from: self.fetch.consume_from.clone(),
            slot_buffer_size: self.write.slot_buffer_size,
            start_new_job: self.job.start_new_job,
            debug_mode: self.debug_mode,
            endpoint: self.hubstorage.endpoint.clone(),
            project_id: self.hubstorage.project_id.clone(),
            auth: self.hubstorage.auth.clone(),
            schedule_url: self.hubstorage.schedule_url.clone(),
            spider: self.job.spider.clone(),
        }
    }
}

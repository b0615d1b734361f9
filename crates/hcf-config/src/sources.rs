// Configuration source loading.
//
// Priority order:
// 1. Environment variables (HCF_* prefix)
// 2. Config file path from HCF_CONFIG
// 3. Inline config content from HCF_CONFIG_CONTENT
// 4. Default config files (./hcf.toml, ./.hcf.toml)
// 5. Built-in defaults

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::HcfConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

const DEFAULT_PATHS: [&str; 2] = ["./hcf.toml", "./.hcf.toml"];

/// Load configuration using the process environment and default file locations.
pub fn load_config() -> Result<HcfConfig> {
    load_config_with_env(&StdEnvSource)
}

pub(crate) fn load_config_with_env<E: EnvSource>(env: &E) -> Result<HcfConfig> {
    let mut config = load_from_file(env)?.unwrap_or_default();
    env_overrides::apply_env_overrides(&mut config, env)?;
    config.validate()?;
    Ok(config)
}

fn load_from_file<E: EnvSource>(env: &E) -> Result<Option<HcfConfig>> {
    if let Some(path) = env.get("CONFIG") {
        return read_file(Path::new(&path)).map(Some);
    }

    if let Some(content) = env.get("CONFIG_CONTENT") {
        let config: HcfConfig = toml::from_str(&content).with_context(|| {
            format!("Failed to parse inline config from {}CONFIG_CONTENT", ENV_PREFIX)
        })?;
        return Ok(Some(config));
    }

    for path in &DEFAULT_PATHS {
        let path = Path::new(path);
        if path.exists() {
            return read_file(path).map(Some);
        }
    }

    Ok(None)
}

fn read_file(path: &Path) -> Result<HcfConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load configuration from a specific file path (for CLI --config flag).
/// Returns error if file doesn't exist or can't be parsed.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<HcfConfig> {
    load_from_file_path_with_env(path, &StdEnvSource)
}

pub(crate) fn load_from_file_path_with_env<E: EnvSource>(
    path: impl AsRef<Path>,
    env: &E,
) -> Result<HcfConfig> {
    let mut config = read_file(path.as_ref())?;
    env_overrides::apply_env_overrides(&mut config, env)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration with graceful fallback to defaults.
/// A missing or unparsable config file is ignored; env overrides still apply.
pub fn load_or_default() -> Result<HcfConfig> {
    load_or_default_with_env(&StdEnvSource)
}

pub(crate) fn load_or_default_with_env<E: EnvSource>(env: &E) -> Result<HcfConfig> {
    let mut config = match load_from_file(env) {
        Ok(Some(file_config)) => file_config,
        Ok(None) => HcfConfig::default(),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unreadable config file");
            HcfConfig::default()
        }
    };
    env_overrides::apply_env_overrides(&mut config, env)?;
    config.validate()?;
    Ok(config)
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env_overrides::tests::MapEnv;
    use std::io::Write;

    const FILE: &str = r#"
        [hubstorage]
        project_id = "123"
        auth = "from-file"

        [fetch]
        links_to_fetch = 100
        consume_from = "test0/test0"
    "#;

    #[test]
    fn test_file_then_env_priority() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FILE.as_bytes()).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let env = MapEnv::default()
            .with("CONFIG", &path)
            .with("LINKS_TO_FETCH", "5");
        let config = load_config_with_env(&env).unwrap();

        assert_eq!(config.hubstorage.project_id, "123");
        assert_eq!(config.hubstorage.auth.as_deref(), Some("from-file"));
        assert_eq!(config.fetch.links_to_fetch, 5);
        assert_eq!(config.write.slot_buffer_size, 4096);
    }

    #[test]
    fn test_inline_content() {
        let env = MapEnv::default().with("CONFIG_CONTENT", FILE);
        let config = load_config_with_env(&env).unwrap();
        assert_eq!(config.fetch.links_to_fetch, 100);
    }

    #[test]
    fn test_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hcf.toml");
        std::fs::write(&path, FILE).unwrap();

        let config = load_from_file_path_with_env(&path, &MapEnv::default()).unwrap();
        assert_eq!(
            config.fetch.consume_from.map(|d| d.to_string()),
            Some("test0/test0".to_string())
        );

        let missing = dir.path().join("missing.toml");
        assert!(load_from_file_path_with_env(&missing, &MapEnv::default()).is_err());
    }

    #[test]
    fn test_load_or_default_ignores_broken_file() {
        let env = MapEnv::default()
            .with("CONFIG", "/nonexistent/hcf.toml")
            .with("PROJECT_ID", "9");
        let config = load_or_default_with_env(&env).unwrap();
        assert_eq!(config.hubstorage.project_id, "9");

        // Strict loading reports the same file
        assert!(load_config_with_env(&env).is_err());
    }
}

//! Layered configuration loading: defaults, then file, then environment

use super::PerformanceConfig;
use crate::constants::{
    ENV_AUDIT_QUEUE_CAPACITY, ENV_CACHE_COMPRESSION_THRESHOLD, ENV_CACHE_STORE_TIMEOUT_MS,
    ENV_MAINTENANCE_INTERVAL_SECS, ENV_SLA_API_CRITICAL_MS, ENV_SLA_API_WARNING_MS,
    ENV_SLA_DB_CRITICAL_MS, ENV_SLA_DB_WARNING_MS, MERCADO_CONFIG_VAR,
};
use crate::errors::{Error, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Builds a [`PerformanceConfig`] from its sources
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    use_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            file: None,
            use_env: true,
        }
    }

    /// Read this file instead of the one named by `MERCADO_CONFIG`
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Skip `MERCADO_*` variables entirely
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    pub fn load(self) -> Result<PerformanceConfig> {
        let file = self.file.or_else(|| {
            if self.use_env {
                std::env::var_os(MERCADO_CONFIG_VAR).map(PathBuf::from)
            } else {
                None
            }
        });

        let mut config = match file {
            Some(path) => read_file(&path)?,
            None => PerformanceConfig::default(),
        };

        if self.use_env {
            apply_env(&mut config)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn read_file(path: &Path) -> Result<PerformanceConfig> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| Error::file_system(path, "read", e))?;
    let config = serde_json::from_str(&contents).map_err(|e| {
        Error::configuration(format!("invalid config file '{}': {e}", path.display()))
    })?;
    debug!(path = %path.display(), "Loaded performance configuration file");
    Ok(config)
}

fn apply_env(config: &mut PerformanceConfig) -> Result<()> {
    override_from_env(
        ENV_CACHE_COMPRESSION_THRESHOLD,
        &mut config.cache.compression_threshold,
    )?;
    override_from_env(ENV_CACHE_STORE_TIMEOUT_MS, &mut config.cache.store_timeout_ms)?;
    override_from_env(
        ENV_SLA_API_WARNING_MS,
        &mut config.sla.api_response_time_warning_ms,
    )?;
    override_from_env(
        ENV_SLA_API_CRITICAL_MS,
        &mut config.sla.api_response_time_critical_ms,
    )?;
    override_from_env(ENV_SLA_DB_WARNING_MS, &mut config.sla.db_query_warning_ms)?;
    override_from_env(ENV_SLA_DB_CRITICAL_MS, &mut config.sla.db_query_critical_ms)?;
    override_from_env(ENV_AUDIT_QUEUE_CAPACITY, &mut config.audit.queue_capacity)?;
    override_from_env(
        ENV_MAINTENANCE_INTERVAL_SECS,
        &mut config.maintenance_interval_secs,
    )?;
    Ok(())
}

fn override_from_env<T>(name: &str, target: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Ok(raw) = std::env::var(name) else {
        return Ok(());
    };
    let value = raw
        .trim()
        .parse::<T>()
        .map_err(|e| Error::configuration(format!("{name}='{raw}' is not valid: {e}")))?;
    debug!(variable = name, "Applied environment override");
    *target = value;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        for name in [
            MERCADO_CONFIG_VAR,
            ENV_CACHE_COMPRESSION_THRESHOLD,
            ENV_CACHE_STORE_TIMEOUT_MS,
            ENV_SLA_API_WARNING_MS,
            ENV_SLA_API_CRITICAL_MS,
            ENV_SLA_DB_WARNING_MS,
            ENV_SLA_DB_CRITICAL_MS,
            ENV_AUDIT_QUEUE_CAPACITY,
            ENV_MAINTENANCE_INTERVAL_SECS,
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_sources() {
        clear_env();
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, PerformanceConfig::default());
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"sla": {{"api_response_time_warning_ms": 300}}, "cache": {{"store_timeout_ms": 100}}}}"#
        )
        .unwrap();

        std::env::set_var(ENV_CACHE_STORE_TIMEOUT_MS, "75");
        std::env::set_var(ENV_AUDIT_QUEUE_CAPACITY, "16");
        let config = ConfigLoader::new().file(file.path()).load().unwrap();
        clear_env();

        assert_eq!(config.sla.api_response_time_warning_ms, 300.0);
        assert_eq!(config.cache.store_timeout_ms, 75);
        assert_eq!(config.audit.queue_capacity, 16);
    }

    #[test]
    #[serial]
    fn test_config_path_from_env() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"maintenance_interval_secs": 5}}"#).unwrap();

        std::env::set_var(MERCADO_CONFIG_VAR, file.path());
        let config = ConfigLoader::new().load().unwrap();
        clear_env();

        assert_eq!(config.maintenance_interval_secs, 5);
    }

    #[test]
    #[serial]
    fn test_unparseable_override_is_an_error() {
        clear_env();
        std::env::set_var(ENV_SLA_DB_WARNING_MS, "fast");
        let result = ConfigLoader::new().load();
        clear_env();

        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    #[serial]
    fn test_override_that_inverts_thresholds_fails_validation() {
        clear_env();
        std::env::set_var(ENV_SLA_API_WARNING_MS, "5000");
        let result = ConfigLoader::new().load();
        clear_env();

        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_without_env_ignores_variables() {
        clear_env();
        std::env::set_var(ENV_AUDIT_QUEUE_CAPACITY, "0");
        let result = ConfigLoader::new().without_env().load();
        clear_env();

        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::new()
            .without_env()
            .file("/definitely/not/here.json")
            .load();
        assert!(matches!(result, Err(Error::FileSystem { .. })));
    }
}

//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, Result, ResultExt};
use std::path::Path;
use tracing::debug;

/// Candidate file names, checked in order relative to the working directory
const CANDIDATES: [&str; 3] = [".roadlink.toml", "roadlink.toml", ".config/roadlink.toml"];

/// Configuration wrapper
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub schema: ConfigSchema,
    pub path: Option<String>,
}

impl Config {
    /// Load configuration from a file path or use defaults
    ///
    /// An explicit path must exist. Without one the standard locations are
    /// searched and defaults are used when none is present.
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(p) = path {
            if !Path::new(p).exists() {
                return Err(Error::config_not_found(p));
            }
        }

        let config_path = path.map(String::from).or_else(find_config_file);

        let schema = if let Some(ref p) = config_path {
            load_config_file(p)?
        } else {
            ConfigSchema::default()
        };

        schema
            .validate()
            .context(format!("In {}", config_path.as_deref().unwrap_or("defaults")))?;

        debug!(path = ?config_path, range_meters = schema.proximity.range_meters, "Configuration loaded");

        Ok(Self {
            schema,
            path: config_path,
        })
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let schema: ConfigSchema = toml::from_str(content)?;
        schema.validate()?;
        Ok(Self { schema, path: None })
    }
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<String> {
    CANDIDATES
        .into_iter()
        .find(|candidate| Path::new(candidate).exists())
        .map(String::from)
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &str) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path)
        .map_err(Error::from)
        .context(format!("Failed to read config file {}", path))?;

    toml::from_str(&content)
        .map_err(Error::from)
        .context(format!("Failed to parse config file {}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.path.is_none());
        assert_eq!(config.schema.proximity.range_meters, 5000.0);
    }

    #[test]
    fn test_config_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[proximity]\nrange_meters = 1200.0\nstaleness_secs = 30\n\n[simulation]\nseed = 7"
        )
        .unwrap();

        let path = file.path().to_str().unwrap();
        let config = Config::load(Some(path)).unwrap();

        assert_eq!(config.path.as_deref(), Some(path));
        assert_eq!(config.schema.proximity.range_meters, 1200.0);
        assert_eq!(config.schema.proximity.staleness_secs, 30);
        assert_eq!(config.schema.simulation.seed, Some(7));
    }

    #[test]
    fn test_config_load_missing_explicit_file() {
        let err = Config::load(Some("/definitely/not/here/roadlink.toml")).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigNotFound);
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[proximity\nrange_meters = ").unwrap();

        let err = Config::load(Some(file.path().to_str().unwrap())).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
        assert!(err.context.is_some());
    }

    #[test]
    fn test_config_load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[proximity]\nrange_meters = -10.0").unwrap();

        let err = Config::load(Some(file.path().to_str().unwrap())).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigValidationError);
    }

    #[test]
    fn test_from_toml() {
        let config = Config::from_toml("[telemetry]\nlog_level = \"debug\"").unwrap();
        assert_eq!(config.schema.telemetry.log_level, "debug");
    }
}

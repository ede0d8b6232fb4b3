//! Settings from the command line and an optional JSON config file

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use cachecore::Policy;
use serde::Deserialize;

/// Capacity used when neither a flag nor the config file sets one
pub const DEFAULT_CAPACITY: i64 = 1024;

/// On-disk config, e.g. `{ "policy": "lfu", "capacity": 128 }`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub policy: Option<String>,
    pub capacity: Option<i64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

/// Effective settings after merging flags over file values over defaults
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub policy: Policy,
    /// Left signed so a negative value reaches the cache constructor and
    /// fails there
    pub capacity: i64,
}

impl Settings {
    pub fn resolve(
        policy: Option<Policy>,
        capacity: Option<i64>,
        file: Option<&FileConfig>,
    ) -> Result<Self> {
        let file_policy = match file.and_then(|f| f.policy.as_deref()) {
            Some(name) => Some(name.parse::<Policy>().context("Invalid policy in config file")?),
            None => None,
        };

        Ok(Self {
            policy: policy.or(file_policy).unwrap_or_default(),
            capacity: capacity
                .or(file.and_then(|f| f.capacity))
                .unwrap_or(DEFAULT_CAPACITY),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(None, None, None).unwrap();

        assert_eq!(settings.policy, Policy::Lru);
        assert_eq!(settings.capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn test_load_file() {
        let file = write_config(r#"{ "policy": "LFU", "capacity": 16 }"#);
        let config = FileConfig::load(file.path()).unwrap();
        let settings = Settings::resolve(None, None, Some(&config)).unwrap();

        assert_eq!(settings.policy, Policy::Lfu);
        assert_eq!(settings.capacity, 16);
    }

    #[test]
    fn test_flags_override_file() {
        let file = write_config(r#"{ "policy": "lfu", "capacity": 16 }"#);
        let config = FileConfig::load(file.path()).unwrap();
        let settings = Settings::resolve(Some(Policy::Lru), Some(2), Some(&config)).unwrap();

        assert_eq!(settings.policy, Policy::Lru);
        assert_eq!(settings.capacity, 2);
    }

    #[test]
    fn test_partial_file() {
        let file = write_config(r#"{ "capacity": 5 }"#);
        let config = FileConfig::load(file.path()).unwrap();
        let settings = Settings::resolve(None, None, Some(&config)).unwrap();

        assert_eq!(settings.policy, Policy::Lru);
        assert_eq!(settings.capacity, 5);
    }

    #[test]
    fn test_bad_file() {
        let unknown_field = write_config(r#"{ "ttl": 5 }"#);
        assert!(FileConfig::load(unknown_field.path()).is_err());

        let bad_policy = FileConfig {
            policy: Some("mru".to_string()),
            capacity: None,
        };
        assert!(Settings::resolve(None, None, Some(&bad_policy)).is_err());

        assert!(FileConfig::load(Path::new("/nonexistent/cachectl.json")).is_err());
    }
}

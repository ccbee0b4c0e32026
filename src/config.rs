use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Where the answering service lives when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Optional user configuration, read from
/// `<config_dir>/lyon-assist/config.json`. A missing file is not an error.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub api_url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("could not determine config directory"))?;
        Ok(config_dir.join("lyon-assist").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_roundtrips_through_json() {
        let config = Config {
            api_url: Some("http://example.com:9000".to_string()),
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.api_url.as_deref(), Some("http://example.com:9000"));
    }

    #[test]
    fn empty_object_means_defaults() {
        let parsed: Config = serde_json::from_str("{}").unwrap();
        assert!(parsed.api_url.is_none());
    }
}

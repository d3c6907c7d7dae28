use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SpecimenError;
use crate::fetcher::DEFAULT_TIMEOUT_SECS;

pub const DEFAULT_CONFIG_FILE: &str = "herbarium-fetch.json";
pub const DEFAULT_META_PATH: &str = "./kew-image-barcodes.csv";
pub const DEFAULT_SAVE_DIR: &str = "./";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub meta_path: Option<PathBuf>,
    #[serde(default)]
    pub save_dir: Option<PathBuf>,
    #[serde(default)]
    pub check_quality: Option<bool>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub meta_path: Option<PathBuf>,
    pub save_dir: Option<PathBuf>,
    pub check_quality: bool,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub meta_path: PathBuf,
    pub save_dir: PathBuf,
    pub check_quality: bool,
    pub timeout: Duration,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(
        path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, SpecimenError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config = if path.is_none() && !config_path.exists() {
            Config::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| SpecimenError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content)
                .map_err(|err| SpecimenError::ConfigParse(err.to_string()))?
        };

        Ok(Self::resolve_config(config, overrides))
    }

    pub fn resolve_config(config: Config, overrides: ConfigOverrides) -> ResolvedConfig {
        ResolvedConfig {
            meta_path: overrides
                .meta_path
                .or(config.meta_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_META_PATH)),
            save_dir: overrides
                .save_dir
                .or(config.save_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SAVE_DIR)),
            check_quality: overrides.check_quality || config.check_quality.unwrap_or(false),
            timeout: Duration::from_secs(
                overrides
                    .timeout_secs
                    .or(config.timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_config() {
        let resolved = ConfigLoader::resolve_config(Config::default(), ConfigOverrides::default());
        assert_eq!(resolved.meta_path, PathBuf::from(DEFAULT_META_PATH));
        assert!(!resolved.check_quality);
        assert_eq!(resolved.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}

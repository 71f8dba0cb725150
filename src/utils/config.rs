//! Configuration loading from JSON files with environment overrides.
//!
//! A configuration named `blind` is read from `<config_dir>/blind.json`, then
//! every `<PREFIX>_BLIND_<KEY>` environment variable overrides the top-level
//! field `<key>`. Variable values are parsed as JSON and fall back to a plain
//! string.

use crate::{CtError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Loads and stores typed configuration documents.
pub struct ConfigManager {
    config_dir: PathBuf,
    environment_prefix: String,
}

impl ConfigManager {
    pub fn new(config_dir: PathBuf, environment_prefix: &str) -> Self {
        Self {
            config_dir,
            environment_prefix: environment_prefix.to_string(),
        }
    }

    /// Defaults, then the file if present, then environment variables.
    pub fn load_config<T>(&self, config_name: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de> + Serialize + Default,
    {
        let mut config_value = serde_json::to_value(T::default())?;

        let config_file_path = self.config_path(config_name);
        if config_file_path.exists() {
            let file_config = self.load_from_file(&config_file_path)?;
            merge_config_values(&mut config_value, file_config);
        }

        merge_config_values(&mut config_value, self.load_from_environment(config_name));

        serde_json::from_value(config_value)
            .map_err(|e| CtError::Config(format!("invalid configuration '{}': {}", config_name, e)))
    }

    pub fn save_config<T: Serialize>(&self, config_name: &str, config: &T) -> Result<()> {
        if !self.config_dir.exists() {
            fs::create_dir_all(&self.config_dir)
                .map_err(|e| CtError::Config(format!("failed to create config directory: {}", e)))?;
        }
        let config_file_path = self.config_path(config_name);
        let config_json = serde_json::to_string_pretty(config)?;
        fs::write(&config_file_path, config_json)
            .map_err(|e| CtError::Config(format!("failed to write config file: {}", e)))?;

        log::info!("Configuration '{}' saved to {:?}", config_name, config_file_path);
        Ok(())
    }

    pub fn config_exists(&self, config_name: &str) -> bool {
        self.config_path(config_name).exists()
    }

    fn config_path(&self, config_name: &str) -> PathBuf {
        self.config_dir.join(format!("{}.json", config_name))
    }

    fn load_from_file(&self, file_path: &Path) -> Result<serde_json::Value> {
        let content = fs::read_to_string(file_path)
            .map_err(|e| CtError::Config(format!("failed to read config file: {}", e)))?;
        serde_json::from_str(&content)
            .map_err(|e| CtError::Config(format!("failed to parse config file {:?}: {}", file_path, e)))
    }

    fn load_from_environment(&self, config_name: &str) -> serde_json::Value {
        let prefix = format!("{}_{}_", self.environment_prefix, config_name.to_uppercase());
        let env_config = env::vars()
            .filter_map(|(key, value)| {
                let config_key = key.strip_prefix(&prefix)?.to_lowercase();
                let parsed_value = serde_json::from_str(&value).unwrap_or(serde_json::Value::String(value));
                Some((config_key, parsed_value))
            })
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(env_config)
    }
}

fn merge_config_values(base: &mut serde_json::Value, overlay: serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base_map), serde_json::Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                base_map.insert(key, value);
            }
        }
        (base, overlay) => {
            *base = overlay;
        }
    }
}

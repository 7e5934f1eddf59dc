use anyhow::{Context, Result};
use log::warn;
use std::{fs, path::PathBuf, sync::RwLock};

use crate::engine::EngineConfig;

/// JSON-file-backed store for the engine's tunable thresholds. A missing
/// or unreadable file falls back to the built-in defaults so a workout
/// can always start.
pub struct ConfigStore {
    path: PathBuf,
    data: RwLock<EngineConfig>,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            match serde_json::from_str(&contents) {
                Ok(config) => config,
                Err(err) => {
                    warn!(
                        "config file {} is invalid ({err}), using defaults",
                        path.display()
                    );
                    EngineConfig::default()
                }
            }
        } else {
            EngineConfig::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn engine(&self) -> EngineConfig {
        self.data.read().unwrap().clone()
    }

    pub fn update(&self, config: EngineConfig) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            *guard = config;
            self.persist(&guard)?;
        }
        Ok(())
    }

    fn persist(&self, data: &EngineConfig) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write config to {}", self.path.display()))
    }
}

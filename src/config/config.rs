use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::error;

/// Model and labels file locations, resolved once at process start and
/// never mutated afterwards. Paths are interpreted first against the
/// bundled resource directory, then against the working directory.
#[derive(Serialize, Deserialize, Clone)]
pub struct Config {
    model_path: String,
    labels_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: "models/category.model.json".to_string(),
            labels_path: "models/category.labels".to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error reading config: {0}")]
    Confy(#[from] confy::ConfyError),
    #[error("Configuration value `{0}` is unresolved or empty")]
    Unresolved(&'static str),
}

impl Config {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Config> {
        match Config::load_or_create(path) {
            Ok(cfg) => Some(cfg),
            Err(err) => {
                error!("Failed to load configuration: {}", err);
                None
            }
        }
    }

    fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();

        let cfg: Config = if path.exists() {
            confy::load_path(path)?
        } else {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            let cfg = Config::default();
            confy::store_path(path, &cfg)?;
            cfg
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.model_path.trim().is_empty() {
            return Err(ConfigError::Unresolved("model_path"));
        }
        if self.labels_path.trim().is_empty() {
            return Err(ConfigError::Unresolved("labels_path"));
        }
        Ok(())
    }

    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    pub fn labels_path(&self) -> &str {
        &self.labels_path
    }

    #[cfg(test)]
    pub(crate) fn for_paths(
        model_path: impl Into<String>,
        labels_path: impl Into<String>,
    ) -> Self {
        Self {
            model_path: model_path.into(),
            labels_path: labels_path.into(),
        }
    }
}

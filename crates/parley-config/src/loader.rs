use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::schema::ParleyConfig;

/// Loads the Parley configuration from disk with env-var overrides.
pub struct ConfigLoader {
    config: Arc<RwLock<ParleyConfig>>,
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Resolve the config path: explicit path > PARLEY_CONFIG env > ~/.parley/parley.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("PARLEY_CONFIG") {
            return PathBuf::from(p);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".parley")
            .join("parley.toml")
    }

    /// Load the config from disk, falling back to defaults.
    pub fn load(path: Option<&Path>) -> parley_core::Result<Self> {
        let config_path = Self::resolve_path(path);
        let config = if config_path.exists() {
            info!(?config_path, "loading configuration");
            let raw = std::fs::read_to_string(&config_path)?;
            toml::from_str::<ParleyConfig>(&raw).map_err(|e| {
                parley_core::ParleyError::Config(format!(
                    "failed to parse {}: {}",
                    config_path.display(),
                    e
                ))
            })?
        } else {
            warn!(?config_path, "config file not found, using defaults");
            ParleyConfig::default()
        };

        let config = Self::apply_env_overrides(config);

        // Validate — log warnings, fail on errors
        match config.validate() {
            Ok(warnings) => {
                for w in &warnings {
                    warn!("{}", w);
                }
            }
            Err(e) => {
                return Err(parley_core::ParleyError::Config(e));
            }
        }

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_path,
        })
    }

    /// Get a read snapshot of the current config.
    pub fn get(&self) -> ParleyConfig {
        self.config.read().clone()
    }

    /// Path the config was loaded from.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Apply env var overrides (PARLEY_AGENT_MODEL, PARLEY_SERVER_LISTEN, etc.)
    fn apply_env_overrides(mut config: ParleyConfig) -> ParleyConfig {
        if let Ok(v) = std::env::var("PARLEY_AGENT_MODEL") {
            config.agent.model = v;
        }
        if let Ok(v) = std::env::var("PARLEY_CLASSIFIER_MODEL") {
            config.classifier.model = v;
        }
        if let Ok(v) = std::env::var("PARLEY_SERVER_LISTEN") {
            config.server.listen = v;
        }
        if let Ok(v) = std::env::var("PARLEY_LOG_LEVEL") {
            config.logging.level = v;
        }
        if let Ok(v) = std::env::var("PARLEY_MAX_SESSION_TURNS") {
            if let Ok(n) = v.parse::<i64>() {
                config.agent.max_session_turns = n;
            }
        }
        // API key: config file takes priority, env is the fallback.
        if config.services.gemini_api_key.is_none() {
            if let Ok(v) = std::env::var("GEMINI_API_KEY") {
                config.services.gemini_api_key = Some(v);
            }
        }
        config
    }

    /// Reload the config from disk.
    pub fn reload(&self) -> parley_core::Result<()> {
        if !self.config_path.exists() {
            return Err(parley_core::ParleyError::Config(format!(
                "config file not found: {}",
                self.config_path.display()
            )));
        }
        let raw = std::fs::read_to_string(&self.config_path)?;
        let new_config = toml::from_str::<ParleyConfig>(&raw).map_err(|e| {
            parley_core::ParleyError::Config(format!(
                "failed to parse {}: {}",
                self.config_path.display(),
                e
            ))
        })?;
        let new_config = Self::apply_env_overrides(new_config);
        *self.config.write() = new_config;
        info!("configuration reloaded");
        Ok(())
    }
}

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PalaceConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub generation: GenerationConfig,
    pub input: InputConfig,
    pub places: PlacesConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GenerationConfig {
    pub api_base: String,
    /// Gemini API key. Usually supplied through `GEMINI_API_KEY` rather than the file.
    pub api_key: String,
    pub text_model: String,
    pub image_model: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    pub max_list_chars: usize,
    pub max_anchor_chars: usize,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PlacesConfig {
    /// When set, place anchors are expected to come from an autocomplete widget
    /// instead of the built-in list of famous places.
    pub maps_api_key: Option<String>,
}

impl Default for PalaceConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            generation: GenerationConfig::default(),
            input: InputConfig::default(),
            places: PlacesConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_palace_dir()
            .join("palaces.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta".into(),
            api_key: String::new(),
            text_model: "gemini-2.5-flash".into(),
            image_model: "gemini-2.5-flash-image-preview".into(),
            request_timeout_secs: 120,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_list_chars: 1000,
            max_anchor_chars: 200,
        }
    }
}

/// Returns `~/.palace/`
pub fn default_palace_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".palace")
}

/// Returns the default config file path: `~/.palace/config.toml`
pub fn default_config_path() -> PathBuf {
    default_palace_dir().join("config.toml")
}

impl PalaceConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            PalaceConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (PALACE_DB, PALACE_LOG_LEVEL,
    /// GEMINI_API_KEY / API_KEY, MAPS_API_KEY).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("PALACE_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("PALACE_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Some(val) = non_empty_env("GEMINI_API_KEY").or_else(|| non_empty_env("API_KEY")) {
            self.generation.api_key = val;
        }
        if let Some(val) = non_empty_env("MAPS_API_KEY") {
            self.places.maps_api_key = Some(val);
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    /// Whether place anchors come from an external autocomplete widget.
    pub fn maps_enabled(&self) -> bool {
        self.places
            .maps_api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

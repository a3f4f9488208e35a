use crate::error::{AetherError, Result};
use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AetherConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout. `None` waits forever, like the browser client did.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// List files through the early `GET /files` endpoint (filenames only).
    #[serde(default)]
    pub legacy_files: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
            legacy_files: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: String,
    /// Custom directory for persisted client state. Defaults to `~/.config/aether/state`.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Product name shown in the sidebar header ("AetherAI", "MineAI", ...).
    #[serde(default = "default_brand")]
    pub brand: String,
    #[serde(default = "default_status_dismiss_secs")]
    pub status_dismiss_secs: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            brand: default_brand(),
            status_dismiss_secs: default_status_dismiss_secs(),
        }
    }
}

/// Valid storage backend names.
pub const VALID_STORAGE_BACKENDS: &[&str] = &["file", "memory"];

// -- Defaults --

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_storage_backend() -> String {
    "file".to_string()
}
fn default_brand() -> String {
    "AetherAI".to_string()
}
fn default_status_dismiss_secs() -> u64 {
    3
}

impl AetherConfig {
    /// Load configuration with three-layer TOML merge:
    /// 1. ~/.config/aether/config.toml (global)
    /// 2. .aether/config.toml (project)
    /// 3. .aether/config.local.toml (local, gitignored)
    pub fn load(project_dir: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                builder = builder.add_source(File::from(global_path).required(false));
            }
        }

        if let Some(dir) = project_dir {
            let project_config = dir.join(".aether").join("config.toml");
            if project_config.exists() {
                builder = builder.add_source(File::from(project_config).required(false));
            }

            let local_config = dir.join(".aether").join("config.local.toml");
            if local_config.exists() {
                builder = builder.add_source(File::from(local_config).required(false));
            }
        }

        let config = builder
            .build()
            .map_err(|e| AetherError::Config(e.to_string()))?;

        let mut cfg: AetherConfig = config
            .try_deserialize()
            .map_err(|e| AetherError::Config(e.to_string()))?;
        cfg.validate();
        Ok(cfg)
    }

    /// Load with defaults only (no files).
    pub fn default_config() -> Self {
        Self {
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
            ui: UiConfig::default(),
        }
    }

    /// Validate config values, fixing what can be fixed and logging warnings.
    /// Lenient: never rejects the config.
    pub fn validate(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !VALID_STORAGE_BACKENDS.contains(&self.storage.backend.as_str()) {
            warnings.push(format!(
                "unknown storage backend '{}', valid: {}",
                self.storage.backend,
                VALID_STORAGE_BACKENDS.join(", ")
            ));
        }

        let trimmed = self.api.base_url.trim_end_matches('/');
        if trimmed.len() != self.api.base_url.len() {
            self.api.base_url = trimmed.to_string();
        }
        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://"))
        {
            warnings.push(format!(
                "api.base_url '{}' is not an http(s) URL, using {}",
                self.api.base_url,
                default_base_url()
            ));
            self.api.base_url = default_base_url();
        }

        if self.api.timeout_secs == Some(0) {
            warnings.push("api.timeout_secs = 0, disabling timeout".to_string());
            self.api.timeout_secs = None;
        }

        if self.ui.status_dismiss_secs == 0 {
            warnings.push("ui.status_dismiss_secs = 0, setting to 1".to_string());
            self.ui.status_dismiss_secs = 1;
        }

        if self.ui.brand.trim().is_empty() {
            warnings.push(format!("ui.brand is empty, using {}", default_brand()));
            self.ui.brand = default_brand();
        }

        for w in &warnings {
            tracing::warn!("config: {}", w);
        }

        warnings
    }
}

fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("aether").join("config.toml"))
}

/// Default directory for persisted client state: `~/.config/aether/state`
pub fn default_state_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join("aether").join("state"))
        .ok_or_else(|| AetherError::Config("cannot determine config directory".to_string()))
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "flow_editor.toml";
pub const SERVICE_URL_ENV: &str = "FLOW_EDITOR_SERVICE_URL";
pub const LOG_FILTER_ENV: &str = "FLOW_EDITOR_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Base URL of the website configuration service.
    pub service_url: String,
    pub request_timeout_secs: u64,
    pub log_filter: String,
    pub log_dir: PathBuf,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            service_url: "http://localhost:8080/api".to_string(),
            request_timeout_secs: 30,
            log_filter: "info".to_string(),
            log_dir: PathBuf::from("log"),
        }
    }
}

impl EditorConfig {
    /// Reads [`CONFIG_FILE`] from the working directory, falling back to
    /// defaults, then applies environment overrides (`.env` included).
    pub fn load_or_default() -> Self {
        dotenv::dotenv().ok();
        let config = EditorConfig::load(Path::new(CONFIG_FILE)).unwrap_or_else(|err| {
            tracing::debug!("Using default editor config: {err:#}");
            EditorConfig::default()
        });
        config.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let serialized = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        EditorConfig::from_toml(&serialized)
    }

    pub fn from_toml(serialized: &str) -> anyhow::Result<Self> {
        toml::from_str(serialized).context("Invalid editor config")
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let serialized = toml::to_string(self).context("Failed to serialize editor config")?;
        std::fs::write(path, serialized).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Applies [`SERVICE_URL_ENV`] and [`LOG_FILTER_ENV`] as looked up by `lookup`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(SERVICE_URL_ENV).filter(|url| !url.is_empty()) {
            self.service_url = url;
        }
        if let Some(filter) = lookup(LOG_FILTER_ENV).filter(|filter| !filter.is_empty()) {
            self.log_filter = filter;
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

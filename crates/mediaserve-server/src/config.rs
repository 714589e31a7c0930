use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Root of the media storage tree
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Background rescan interval in seconds; 0 disables rescanning
    #[serde(default)]
    pub rescan_interval_secs: u64,

    /// Bounding-box edge length of generated thumbnails, in pixels
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: u32,

    /// Allow-listed upload file extensions (lowercase, without dot)
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Name of the thumbnail store directory inside the storage root
    #[serde(default = "default_thumbnail_dir_name")]
    pub thumbnail_dir_name: String,

    /// Optional cities CSV enabling reverse geocoding
    #[serde(default)]
    pub cities_file: Option<PathBuf>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("./media")
}

fn default_thumbnail_size() -> u32 {
    256
}

fn default_allowed_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "gif"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_thumbnail_dir_name() -> String {
    ".thumbnails".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            storage_dir: default_storage_dir(),
            rescan_interval_secs: 0,
            thumbnail_size: default_thumbnail_size(),
            allowed_extensions: default_allowed_extensions(),
            thumbnail_dir_name: default_thumbnail_dir_name(),
            cities_file: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `mediaserve.toml` in the current directory,
    /// or use defaults when no file exists
    pub fn load() -> Result<Self> {
        let config_path = PathBuf::from("mediaserve.toml");
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("no config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Get the full bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Absolute path of the thumbnail store
    pub fn thumbnail_dir(&self) -> PathBuf {
        self.storage_dir.join(&self.thumbnail_dir_name)
    }

    /// Whether an extension (without dot) is allow-listed for upload
    pub fn extension_allowed(&self, extension: &str) -> bool {
        self.allowed_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }
}

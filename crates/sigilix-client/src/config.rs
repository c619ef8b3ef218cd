//! Client configuration loaded from environment variables.
//!
//! Every setting has a default so an embedder can start with zero
//! configuration and point the client at the public instance.

use std::path::PathBuf;

use directories::ProjectDirs;
use sigilix_shared::constants::{APP_NAME, DEFAULT_NOTIFICATION_LIMIT};

pub const DEFAULT_API_URL: &str = "https://sigilix.aperlaqf.work/api/";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to. Always ends with `/`.
    /// Env: `SIGILIX_API_URL`
    /// Default: [`DEFAULT_API_URL`]
    pub api_url: String,

    /// Directory holding the identity file and the per-user databases.
    /// Env: `SIGILIX_DATA_DIR`
    /// Default: the platform data directory, or `.` when none exists.
    pub data_dir: PathBuf,

    /// File name of the encrypted identity inside `data_dir`.
    /// Env: `SIGILIX_IDENTITY_FILE`
    /// Default: `config.json`
    pub identity_file_name: String,

    /// Maximum number of notifications fetched per pull.
    /// Env: `SIGILIX_NOTIFICATION_LIMIT`
    /// Default: `100`
    pub notification_batch_limit: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            data_dir: default_data_dir(),
            identity_file_name: "config.json".to_string(),
            notification_batch_limit: DEFAULT_NOTIFICATION_LIMIT,
        }
    }
}

impl ClientConfig {
    /// Defaults with every file placed under `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("SIGILIX_API_URL") {
            if url.starts_with("http://") || url.starts_with("https://") {
                config.api_url = normalize_api_url(url);
            } else {
                tracing::warn!(value = %url, "Invalid SIGILIX_API_URL, using default");
            }
        }

        if let Ok(dir) = std::env::var("SIGILIX_DATA_DIR") {
            if !dir.is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }

        if let Ok(name) = std::env::var("SIGILIX_IDENTITY_FILE") {
            if !name.is_empty() {
                config.identity_file_name = name;
            }
        }

        if let Ok(val) = std::env::var("SIGILIX_NOTIFICATION_LIMIT") {
            match val.parse::<u32>() {
                Ok(n) if n > 0 => config.notification_batch_limit = n,
                _ => tracing::warn!(value = %val, "Invalid SIGILIX_NOTIFICATION_LIMIT, using default"),
            }
        }

        config
    }

    pub fn identity_path(&self) -> PathBuf {
        self.data_dir.join(&self.identity_file_name)
    }
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", APP_NAME, APP_NAME)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Endpoint paths are relative, so the base must end with a slash.
fn normalize_api_url(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

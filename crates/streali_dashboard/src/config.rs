// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dashboard configuration.
//!
//! Stored as RON in the user's config directory.
//! Default location: `<config dir>/streali/dashboard.ron`

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file name inside the `streali` directory
pub const CONFIG_FILE_NAME: &str = "dashboard.ron";

/// Overrides [`DashboardConfig::api_base_url`]
pub const ENV_API_URL: &str = "STREALI_API_URL";

/// Overrides [`DashboardConfig::user_id`]
pub const ENV_USER_ID: &str = "STREALI_USER_ID";

/// Maximum number of recent documents to track
pub const MAX_RECENT_DOCUMENTS: usize = 10;

/// Errors from reading or writing the config file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Filesystem error
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid RON
    #[error("config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Encoding failed
    #[error("config encode error: {0}")]
    Encode(#[from] ron::Error),
}

/// User settings for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Backend REST and event-stream base URL
    pub api_base_url: String,
    /// Streamer whose events are shown
    pub user_id: String,
    /// Substituted for `{username}` in text previews
    pub username: String,
    /// Host of the standalone event page handed to streaming software
    pub embed_host: String,
    /// Alert document opened at startup
    pub alert_path: Option<PathBuf>,
    /// Canvas zoom factor
    pub canvas_zoom: f32,
    /// Timeline scale
    pub pixels_per_second: f32,
    /// Recently opened documents, newest first
    pub recent_documents: VecDeque<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.streali.com".to_string(),
            user_id: String::new(),
            username: "streamer".to_string(),
            embed_host: "https://dashboard.streali.com".to_string(),
            alert_path: None,
            canvas_zoom: 0.5,
            pixels_per_second: streali_alert::DEFAULT_PIXELS_PER_SECOND,
            recent_documents: VecDeque::new(),
        }
    }
}

impl DashboardConfig {
    /// Apply environment overrides through `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            tracing::info!("Using API URL from {}", ENV_API_URL);
            self.api_base_url = url;
        }
        if let Some(user_id) = lookup(ENV_USER_ID).filter(|v| !v.is_empty()) {
            tracing::info!("Using user id from {}", ENV_USER_ID);
            self.user_id = user_id;
        }
    }

    /// Whether live events can be requested
    pub fn has_user(&self) -> bool {
        !self.user_id.trim().is_empty()
    }

    /// Move `path` to the front of the recent list
    pub fn add_recent(&mut self, path: PathBuf) {
        self.recent_documents.retain(|p| p != &path);
        self.recent_documents.push_front(path);
        self.recent_documents.truncate(MAX_RECENT_DOCUMENTS);
    }
}

/// Default location of the config file
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("streali")
        .join(CONFIG_FILE_NAME)
}

/// Load the config from `path`.
///
/// A missing file is created with the defaults. A broken file logs a
/// warning and yields the defaults without overwriting it.
pub fn load_config(path: &Path) -> DashboardConfig {
    tracing::info!("Loading config from {:?}", path);

    if !path.exists() {
        tracing::info!("Config file doesn't exist, writing defaults");
        let config = DashboardConfig::default();
        if let Err(e) = save_config(&config, path) {
            tracing::warn!("Failed to write default config: {}", e);
        }
        return config;
    }

    match read_config(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            DashboardConfig::default()
        }
    }
}

fn read_config(path: &Path) -> Result<DashboardConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(ron::from_str(&contents)?)
}

/// Write the config to `path`, creating parent directories
pub fn save_config(config: &DashboardConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = ron::ser::to_string_pretty(config, ron::ser::PrettyConfig::default())?;
    std::fs::write(path, contents)?;
    tracing::debug!("Saved config to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("streali").join(CONFIG_FILE_NAME);

        let config = load_config(&path);
        assert_eq!(config, DashboardConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_saved_config_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut config = DashboardConfig::default();
        config.user_id = "42".to_string();
        config.alert_path = Some(PathBuf::from("follow.alert.ron"));
        save_config(&config, &path).unwrap();

        assert_eq!(load_config(&path), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "(user_id: \"7\")").unwrap();

        let config = load_config(&path);
        assert_eq!(config.user_id, "7");
        assert_eq!(config.api_base_url, DashboardConfig::default().api_base_url);
    }

    #[test]
    fn test_broken_file_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "(user_id: ").unwrap();

        assert_eq!(load_config(&path), DashboardConfig::default());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "(user_id: ");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = DashboardConfig::default();
        config.apply_overrides(|key| match key {
            ENV_API_URL => Some("http://localhost:3000".to_string()),
            ENV_USER_ID => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.api_base_url, "http://localhost:3000");
        assert!(!config.has_user());
    }

    #[test]
    fn test_recent_documents_are_unique_and_bounded() {
        let mut config = DashboardConfig::default();
        for i in 0..(MAX_RECENT_DOCUMENTS + 3) {
            config.add_recent(PathBuf::from(format!("{i}.alert.ron")));
        }
        config.add_recent(PathBuf::from("5.alert.ron"));

        assert_eq!(config.recent_documents.len(), MAX_RECENT_DOCUMENTS);
        assert_eq!(config.recent_documents[0], PathBuf::from("5.alert.ron"));
        assert_eq!(config.recent_documents.iter().filter(|p| p.ends_with("5.alert.ron")).count(), 1);
    }
}

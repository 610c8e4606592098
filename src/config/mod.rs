//! Configuration and credential storage
//!
//! Everything the client persists about the session lives in one TOML file
//! with explicit load/save; no other module reads storage directly.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::{StoredToken, TokenStore};

const DEFAULT_API_BASE: &str = "https://api.petmarket.io/v1";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Application configuration
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Override for the API base URL (no trailing slash)
    pub api_base_url: Option<String>,
    /// Stored session token (bearer auth for all API calls)
    pub session_token: Option<StoredToken>,
    /// Stored refresh token
    pub refresh_token: Option<String>,
    /// Id of the signed-in user (from login response or token claims)
    pub user_id: Option<String>,
    /// Display name of the signed-in user
    pub user_name: Option<String>,
    /// Messaging poll cadence override, in seconds
    pub poll_interval_secs: Option<u64>,
}

impl Config {
    /// Get config directory path
    fn config_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "petmarket", "petmarket-cli")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().to_path_buf())
    }

    /// Get config file path
    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir).context("Failed to create config directory")?;
        self.save_to(&Self::config_path()?)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;

        // Set restrictive permissions on config file (contains tokens)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(path, perms).context("Failed to set config permissions")?;
        }

        Ok(())
    }

    /// API base URL, without trailing slash.
    pub fn api_base_url(&self) -> String {
        self.api_base_url
            .as_deref()
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
    }

    /// Messaging poll cadence.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(
            self.poll_interval_secs
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECS)
                .max(1),
        )
    }

    pub fn set_current_user(&mut self, id: String, name: Option<String>) {
        self.user_id = Some(id);
        self.user_name = name;
    }
}

impl TokenStore for Config {
    fn get_access_token(&self) -> Option<StoredToken> {
        self.session_token.clone()
    }

    fn set_access_token(&mut self, token: String, expires_in: Option<u64>) {
        self.session_token = Some(StoredToken::new(token, expires_in));
    }

    fn get_refresh_token(&self) -> Option<String> {
        self.refresh_token.clone()
    }

    fn set_refresh_token(&mut self, token: String) {
        self.refresh_token = Some(token);
    }

    fn clear_tokens(&mut self) {
        self.session_token = None;
        self.refresh_token = None;
        self.user_id = None;
        self.user_name = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.set_access_token("tok".to_string(), Some(3600));
        config.set_refresh_token("refresh".to_string());
        config.set_current_user("user-1".to_string(), Some("Sam".to_string()));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.get_access_token().unwrap().token, "tok");
        assert_eq!(loaded.get_refresh_token().as_deref(), Some("refresh"));
        assert_eq!(loaded.user_id.as_deref(), Some("user-1"));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert!(loaded.session_token.is_none());
        assert_eq!(loaded.api_base_url(), DEFAULT_API_BASE);
        assert_eq!(loaded.poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_clear_tokens_drops_identity_too() {
        let mut config = Config::default();
        config.set_access_token("tok".to_string(), None);
        config.set_current_user("user-1".to_string(), None);
        config.clear_tokens();
        assert!(config.session_token.is_none());
        assert!(config.user_id.is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let config = Config {
            api_base_url: Some("https://staging.petmarket.io/v1/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.api_base_url(), "https://staging.petmarket.io/v1");
    }
}

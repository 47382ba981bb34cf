//! Admin feed configuration.
//!
//! Stored as TOML at `$RENTDESK_CONFIG` if set, otherwise:
//! - Linux: `~/.config/rentdesk/admin-feed.toml`
//! - Windows: `%APPDATA%/rentdesk/admin-feed.toml`

use std::path::{Path, PathBuf};

use rentdesk_notifications::NotificationConfig;
use rentdesk_realtime::RealtimeConfig;
use serde::{Deserialize, Serialize};

/// Environment variable overriding the config file location.
const CONFIG_ENV: &str = "RENTDESK_CONFIG";

/// Admin feed configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Real-time connection settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,

    /// Notification feed settings.
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path())
    }

    /// Loads configuration from `path`, writing defaults there if it does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Returns the configuration file path.
fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }

    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("rentdesk")
            .join("admin-feed.toml")
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("rentdesk").join("admin-feed.toml")
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        PathBuf::from("/tmp/rentdesk/admin-feed.toml")
    }
}

//! Application settings

use std::path::{Path, PathBuf};

use ppp_iface::{ConnectOptions, InterfaceConfig, ReconnectPolicy};
use ppp_sim::SimPeerConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading or saving settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine settings path")]
    NoConfigDir,

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Interface tuning
    #[serde(default)]
    pub interface: InterfaceConfig,
    /// Auth mode and credentials
    #[serde(default)]
    pub connect: ConnectOptions,
    /// Reconnect backoff
    #[serde(default)]
    pub reconnect: ReconnectPolicy,
    /// Simulated peer behaviour
    #[serde(default)]
    pub peer: SimPeerConfig,
    /// Supervisor tick period in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u32,
    /// Dump every frame at trace level
    #[serde(default)]
    pub trace_frames: bool,
}

fn default_tick_ms() -> u32 {
    20
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interface: InterfaceConfig::default(),
            connect: ConnectOptions::default(),
            reconnect: ReconnectPolicy::default(),
            peer: SimPeerConfig::default(),
            tick_ms: default_tick_ms(),
            trace_frames: false,
        }
    }
}

impl Settings {
    /// Get the XDG config directory for pppctl
    /// Uses $XDG_CONFIG_HOME/pppctl on Linux/macOS, falls back to ~/.config/pppctl
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("pppctl"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("pppctl"))
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        Self::settings_path()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Load settings from an explicit file
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<PathBuf, SettingsError> {
        let path = Self::settings_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to an explicit file, creating its directory
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppp_link::AuthMode;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("pppctl-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"connect":{"authmode":1,"username":"u","password":"p"}}"#)
                .unwrap();
        assert_eq!(settings.connect.authmode, AuthMode::PAP);
        assert_eq!(settings.interface, InterfaceConfig::default());
        assert_eq!(settings.tick_ms, 20);
        assert!(!settings.trace_frames);
    }

    #[test]
    fn test_save_then_load() {
        let path = scratch_path("roundtrip/settings.json");
        let mut settings = Settings::default();
        settings.reconnect.max_attempts = Some(5);
        settings.peer.drop_after_ms = Some(10_000);

        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::load_from(&scratch_path("absent.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }

    #[test]
    fn test_malformed_file() {
        let path = scratch_path("malformed/settings.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        let err = Settings::load_from(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));

        let _ = std::fs::remove_file(&path);
    }
}

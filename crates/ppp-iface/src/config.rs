//! Interface tuning parameters

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PppError;

/// Default bytes read per poll
pub const DEFAULT_POLL_CHUNK: u32 = 256;

/// Default bound on the graceful close wait
pub const DEFAULT_CLOSE_TIMEOUT_MS: u32 = 4000;

/// Default pause between polls while waiting for a clean close
pub const DEFAULT_CLOSE_POLL_INTERVAL_MS: u32 = 10;

/// Largest accepted poll chunk
pub const MAX_POLL_CHUNK: u32 = 64 * 1024;

/// Tuning for a [`crate::PppInterface`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceConfig {
    /// Maximum bytes read from the stream per poll
    pub poll_chunk: u32,
    /// Deadline for the graceful close during deactivation
    pub close_timeout_ms: u32,
    /// Pause between polls while waiting for the close to complete
    pub close_poll_interval_ms: u32,
    /// Read timeout used by poll; 0 means non-blocking
    pub read_timeout_ms: u32,
    /// Write timeout used by the output path
    pub write_timeout_ms: u32,
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            poll_chunk: DEFAULT_POLL_CHUNK,
            close_timeout_ms: DEFAULT_CLOSE_TIMEOUT_MS,
            close_poll_interval_ms: DEFAULT_CLOSE_POLL_INTERVAL_MS,
            read_timeout_ms: 0,
            write_timeout_ms: 100,
        }
    }
}

impl InterfaceConfig {
    /// Parameter names accepted by [`get`](Self::get) and [`set`](Self::set)
    pub const KEYS: &'static [&'static str] = &[
        "poll_chunk",
        "close_timeout_ms",
        "close_poll_interval_ms",
        "read_timeout_ms",
        "write_timeout_ms",
    ];

    /// Read a parameter by name
    pub fn get(&self, key: &str) -> Result<u32, PppError> {
        match key {
            "poll_chunk" => Ok(self.poll_chunk),
            "close_timeout_ms" => Ok(self.close_timeout_ms),
            "close_poll_interval_ms" => Ok(self.close_poll_interval_ms),
            "read_timeout_ms" => Ok(self.read_timeout_ms),
            "write_timeout_ms" => Ok(self.write_timeout_ms),
            other => Err(PppError::UnknownConfigParam(other.to_string())),
        }
    }

    /// Write a parameter by name
    ///
    /// The configuration is left untouched when the key or value is rejected.
    pub fn set(&mut self, key: &str, value: u32) -> Result<(), PppError> {
        let mut next = self.clone();
        match key {
            "poll_chunk" => next.poll_chunk = value,
            "close_timeout_ms" => next.close_timeout_ms = value,
            "close_poll_interval_ms" => next.close_poll_interval_ms = value,
            "read_timeout_ms" => next.read_timeout_ms = value,
            "write_timeout_ms" => next.write_timeout_ms = value,
            other => return Err(PppError::UnknownConfigParam(other.to_string())),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), PppError> {
        if self.poll_chunk == 0 || self.poll_chunk > MAX_POLL_CHUNK {
            return Err(PppError::InvalidConfigValue {
                key: "poll_chunk".into(),
                value: self.poll_chunk,
                reason: "must be between 1 and 65536",
            });
        }
        // A zero interval would spin without letting time pass on a
        // sleep-driven clock.
        if self.close_poll_interval_ms == 0 {
            return Err(PppError::InvalidConfigValue {
                key: "close_poll_interval_ms".into(),
                value: 0,
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Read timeout as a duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms.into())
    }

    /// Write timeout as a duration
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms.into())
    }

    /// Close poll interval as a duration
    pub fn close_poll_interval(&self) -> Duration {
        Duration::from_millis(self.close_poll_interval_ms.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InterfaceConfig::default();
        assert_eq!(config.poll_chunk, 256);
        assert_eq!(config.close_timeout_ms, 4000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_get_set_by_name() {
        let mut config = InterfaceConfig::default();
        for key in InterfaceConfig::KEYS {
            assert!(config.get(key).is_ok(), "{} should be readable", key);
        }

        config.set("close_timeout_ms", 250).unwrap();
        assert_eq!(config.get("close_timeout_ms").unwrap(), 250);
    }

    #[test]
    fn test_unknown_key() {
        let mut config = InterfaceConfig::default();
        assert!(matches!(
            config.get("mtu"),
            Err(PppError::UnknownConfigParam(k)) if k == "mtu"
        ));
        assert!(config.set("mtu", 1500).is_err());
    }

    #[test]
    fn test_rejected_value_leaves_config_untouched() {
        let mut config = InterfaceConfig::default();
        let err = config.set("poll_chunk", 0).unwrap_err();
        assert!(err.is_config_error());
        assert_eq!(config.poll_chunk, 256);

        assert!(config.set("close_poll_interval_ms", 0).is_err());
        assert_eq!(config.close_poll_interval_ms, 10);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: InterfaceConfig = serde_json::from_str(r#"{"close_timeout_ms": 1000}"#).unwrap();
        assert_eq!(config.close_timeout_ms, 1000);
        assert_eq!(config.poll_chunk, 256);
    }
}

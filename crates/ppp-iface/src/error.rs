//! Error types for the interface handle

use ppp_link::{AuthMode, EngineError};
use thiserror::Error;

/// Errors that can occur while driving a PPP interface
///
/// Only synchronous failures are reported here. Link-level failures that
/// happen during negotiation are surfaced through `status()` and
/// `is_connected()` instead.
#[derive(Debug, Error)]
pub enum PppError {
    /// The engine could not be created
    #[error("init failed: {0}")]
    ResourceInit(#[source] EngineError),

    /// Operation requires an active interface
    #[error("interface must be active")]
    NotActive,

    /// A connect is already pending or established
    #[error("connect already in progress")]
    AlreadyInProgress,

    /// Unrecognized authentication mode
    #[error("invalid auth mode: {0}")]
    InvalidAuth(u32),

    /// Username or password missing for an authenticated connect
    #[error("{mode} authentication requires a non-empty {field}")]
    MissingCredentials {
        /// Requested auth mode
        mode: AuthMode,
        /// Which credential is missing
        field: &'static str,
    },

    /// The engine refused to start negotiation
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] EngineError),

    /// Unknown configuration parameter
    #[error("unknown config param: {0}")]
    UnknownConfigParam(String),

    /// Configuration value out of range
    #[error("invalid value {value} for {key}: {reason}")]
    InvalidConfigValue {
        key: String,
        value: u32,
        reason: &'static str,
    },

    /// I/O error on the stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port error
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PppError {
    /// True for errors raised before any engine or stream interaction
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAuth(_)
                | Self::MissingCredentials { .. }
                | Self::UnknownConfigParam(_)
                | Self::InvalidConfigValue { .. }
        )
    }
}

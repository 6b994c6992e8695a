//! Authentication settings handed to the engine before connect

use std::fmt;

/// PPP authentication protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AuthMode {
    /// No authentication
    #[default]
    None,
    /// Password Authentication Protocol
    Pap,
    /// Challenge Handshake Authentication Protocol
    Chap,
}

impl AuthMode {
    /// Raw code for `AUTH_NONE`
    pub const NONE: u32 = 0;
    /// Raw code for `AUTH_PAP`
    pub const PAP: u32 = 1;
    /// Raw code for `AUTH_CHAP`
    pub const CHAP: u32 = 2;

    /// Decode a raw auth mode, `None` for anything unrecognized
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            Self::NONE => Some(Self::None),
            Self::PAP => Some(Self::Pap),
            Self::CHAP => Some(Self::Chap),
            _ => None,
        }
    }

    /// Raw code for this mode
    pub fn code(&self) -> u32 {
        match self {
            Self::None => Self::NONE,
            Self::Pap => Self::PAP,
            Self::Chap => Self::CHAP,
        }
    }

    /// Whether this mode needs a username and password
    pub fn requires_credentials(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Short protocol name
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pap => "PAP",
            Self::Chap => "CHAP",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Credentials for PAP or CHAP
#[derive(Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Protocol to authenticate with
    pub mode: AuthMode,
    /// Username sent to the peer
    pub username: String,
    /// Secret, never logged
    pub password: String,
}

impl AuthConfig {
    /// Create a new auth configuration
    pub fn new(mode: AuthMode, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            mode,
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("mode", &self.mode)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_codes() {
        assert_eq!(AuthMode::from_code(0), Some(AuthMode::None));
        assert_eq!(AuthMode::from_code(1), Some(AuthMode::Pap));
        assert_eq!(AuthMode::from_code(2), Some(AuthMode::Chap));
        assert_eq!(AuthMode::from_code(99), None);
        assert_eq!(AuthMode::Chap.code(), 2);
    }

    #[test]
    fn test_credentials_requirement() {
        assert!(!AuthMode::None.requires_credentials());
        assert!(AuthMode::Pap.requires_credentials());
        assert!(AuthMode::Chap.requires_credentials());
    }

    #[test]
    fn test_debug_redacts_password() {
        let auth = AuthConfig::new(AuthMode::Pap, "user", "hunter2");
        let rendered = format!("{:?}", auth);
        assert!(rendered.contains("user"));
        assert!(!rendered.contains("hunter2"));
    }
}

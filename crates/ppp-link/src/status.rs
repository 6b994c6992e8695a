//! Engine status codes
//!
//! The numeric values match the error codes a PPP engine reports through its
//! status callback, so they can be carried across an FFI boundary unchanged.

use std::fmt;

/// Phase transition reported by a link engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LinkStatus {
    /// Negotiation finished, the link is up
    Connected,
    /// Invalid parameter
    Param,
    /// Unable to open the PPP session
    Open,
    /// Invalid I/O device for PPP
    Device,
    /// Unable to allocate resources
    Alloc,
    /// A requested close has completed
    User,
    /// Connection lost
    ConnectionLost,
    /// Failed authentication challenge
    AuthFail,
    /// Failed to meet protocol
    Protocol,
    /// Peer stopped answering echo requests
    PeerDead,
    /// Idle timeout
    IdleTimeout,
    /// Max connect time reached
    ConnectTime,
    /// Loopback detected
    Loopback,
    /// A code this crate does not know about
    Unknown(i32),
}

impl LinkStatus {
    /// Decode a raw engine status code
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Connected,
            1 => Self::Param,
            2 => Self::Open,
            3 => Self::Device,
            4 => Self::Alloc,
            5 => Self::User,
            6 => Self::ConnectionLost,
            7 => Self::AuthFail,
            8 => Self::Protocol,
            9 => Self::PeerDead,
            10 => Self::IdleTimeout,
            11 => Self::ConnectTime,
            12 => Self::Loopback,
            other => Self::Unknown(other),
        }
    }

    /// Raw engine status code
    pub fn code(&self) -> i32 {
        match self {
            Self::Connected => 0,
            Self::Param => 1,
            Self::Open => 2,
            Self::Device => 3,
            Self::Alloc => 4,
            Self::User => 5,
            Self::ConnectionLost => 6,
            Self::AuthFail => 7,
            Self::Protocol => 8,
            Self::PeerDead => 9,
            Self::IdleTimeout => 10,
            Self::ConnectTime => 11,
            Self::Loopback => 12,
            Self::Unknown(code) => *code,
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Connected => "Connected",
            Self::Param => "Invalid parameter",
            Self::Open => "Unable to open PPP session",
            Self::Device => "Invalid I/O device for PPP",
            Self::Alloc => "Unable to allocate resources",
            Self::User => "User interrupt",
            Self::ConnectionLost => "Connection lost",
            Self::AuthFail => "Failed authentication challenge",
            Self::Protocol => "Failed to meet protocol",
            Self::PeerDead => "Connection timeout",
            Self::IdleTimeout => "Idle Timeout",
            Self::ConnectTime => "Max connect time reached",
            Self::Loopback => "Loopback detected",
            Self::Unknown(_) => "Unknown error code",
        }
    }

    /// True for codes that end a session with an error
    ///
    /// `Connected`, `User` and unknown codes are not link errors.
    pub fn is_link_error(&self) -> bool {
        !matches!(self, Self::Connected | Self::User | Self::Unknown(_))
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "{} {}", self.description(), code),
            _ => f.write_str(self.description()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_round_trip() {
        for code in 0..=12 {
            let status = LinkStatus::from_code(code);
            assert!(!matches!(status, LinkStatus::Unknown(_)));
            assert_eq!(status.code(), code);
        }
    }

    #[test]
    fn test_unknown_code_is_preserved() {
        let status = LinkStatus::from_code(42);
        assert_eq!(status, LinkStatus::Unknown(42));
        assert_eq!(status.code(), 42);
        assert_eq!(status.to_string(), "Unknown error code 42");
    }

    #[test]
    fn test_link_error_classification() {
        assert!(!LinkStatus::Connected.is_link_error());
        assert!(!LinkStatus::User.is_link_error());
        assert!(!LinkStatus::Unknown(-3).is_link_error());
        assert!(LinkStatus::ConnectionLost.is_link_error());
        assert!(LinkStatus::AuthFail.is_link_error());
        assert!(LinkStatus::Loopback.is_link_error());
    }
}

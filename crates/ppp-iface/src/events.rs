//! Events emitted by an interface handle
//!
//! The handle buffers events as it activates, connects and receives status
//! callbacks; observers collect them with `drain_events()` after each call.

use ppp_link::{AuthMode, IfConfig, LinkStatus};

/// Something observable happened on the interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------
    /// Engine created, interface registered
    Activated,

    /// Engine released
    Deactivated {
        /// Whether the graceful close completed before teardown
        clean_close: bool,
    },

    /// Negotiation requested
    ConnectRequested {
        /// Authentication in use
        auth: AuthMode,
    },

    // -------------------------------------------------------------------------
    // Status callbacks
    // -------------------------------------------------------------------------
    /// Negotiation completed
    LinkUp {
        /// Negotiated addresses
        config: IfConfig,
        /// Whether the address was usable (non-zero)
        connected: bool,
    },

    /// The session ended with a link error
    LinkDown {
        /// Reported reason
        status: LinkStatus,
    },

    /// A requested close completed
    Closed,

    /// The engine reported a code this crate does not know
    UnknownStatus {
        /// Raw code
        code: i32,
    },

    /// Deactivation gave up waiting for the close to complete
    CloseTimedOut {
        /// How long the wait lasted
        waited_ms: u32,
    },
}

impl LinkEvent {
    /// Check if this event came from an engine status callback
    pub fn is_status(&self) -> bool {
        matches!(
            self,
            LinkEvent::LinkUp { .. }
                | LinkEvent::LinkDown { .. }
                | LinkEvent::Closed
                | LinkEvent::UnknownStatus { .. }
        )
    }

    /// Check if this is a lifecycle event
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            LinkEvent::Activated
                | LinkEvent::Deactivated { .. }
                | LinkEvent::ConnectRequested { .. }
                | LinkEvent::CloseTimedOut { .. }
        )
    }

    /// The engine status behind this event, if any
    pub fn link_status(&self) -> Option<LinkStatus> {
        match self {
            LinkEvent::LinkUp { .. } => Some(LinkStatus::Connected),
            LinkEvent::LinkDown { status } => Some(*status),
            LinkEvent::Closed => Some(LinkStatus::User),
            LinkEvent::UnknownStatus { code } => Some(LinkStatus::Unknown(*code)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_classification() {
        let down = LinkEvent::LinkDown {
            status: LinkStatus::PeerDead,
        };
        assert!(down.is_status());
        assert!(!down.is_lifecycle());
        assert_eq!(down.link_status(), Some(LinkStatus::PeerDead));

        let activated = LinkEvent::Activated;
        assert!(activated.is_lifecycle());
        assert_eq!(activated.link_status(), None);

        assert_eq!(LinkEvent::Closed.link_status(), Some(LinkStatus::User));
    }
}

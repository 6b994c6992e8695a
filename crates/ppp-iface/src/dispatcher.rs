//! Status dispatcher
//!
//! The state machine run by the engine's status callback. It executes
//! synchronously inside whichever engine call produced the transition,
//! usually `poll`, and only ever touches the [`LinkState`] it is handed.
//!
//! It never re-issues connect. Link errors are flagged with
//! [`STATUS_ERROR`] and the decision to retry belongs to the caller (see
//! [`crate::Supervisor`]).
//!
//! Not safe for concurrent delivery: if statuses ever arrive from more than
//! one thread, the caller must serialize them per interface.

use ppp_link::{InterfaceRecord, LinkStatus};
use tracing::{debug, info, warn};

use crate::events::LinkEvent;
use crate::state::{LinkState, STATUS_ERROR, STATUS_UP};

/// What the caller may do after a status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectHint {
    /// Nothing changes
    None,
    /// The session was closed on request, do not reconnect
    Stop,
    /// The session failed; a higher-level loop may connect again
    CallerMayRetry,
}

/// Result of dispatching one status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    /// Event to publish
    pub event: LinkEvent,
    /// Reconnect policy for this status
    pub hint: ReconnectHint,
}

/// Apply an engine status to the interface state
///
/// Every error status clears `connected` along with `connect_active`,
/// including errors that arrive while the link was up. A link is never
/// usable without a session in progress.
pub fn dispatch(state: &mut LinkState, status: LinkStatus, netif: &InterfaceRecord) -> Dispatch {
    match status {
        LinkStatus::Connected => {
            info!("status_cb: Connected");
            info!("   our_ipaddr  = {}", netif.addr());
            info!("   his_ipaddr  = {}", netif.gateway());
            info!("   netmask     = {}", netif.netmask());
            info!("   dns1        = {}", netif.dns(0));
            info!("   dns2        = {}", netif.dns(1));

            state.status = STATUS_UP;
            state.connected = state.connect_active && netif.has_address();
            if !state.connected {
                warn!("{}: link up without a usable address", netif.name());
            }

            Dispatch {
                event: LinkEvent::LinkUp {
                    config: netif.ifconfig(),
                    connected: state.connected,
                },
                hint: ReconnectHint::None,
            }
        }
        LinkStatus::User => {
            info!("status_cb: {}", status.description());
            if state.connect_active {
                if !state.clean_close.signal() {
                    debug!("clean close already signalled");
                }
            } else {
                debug!("close completion with no session in progress");
            }
            state.end_session();

            Dispatch {
                event: LinkEvent::Closed,
                hint: ReconnectHint::Stop,
            }
        }
        LinkStatus::Unknown(code) => {
            warn!("status_cb: Unknown error code {}", code);
            Dispatch {
                event: LinkEvent::UnknownStatus { code },
                hint: ReconnectHint::None,
            }
        }
        error => {
            warn!("status_cb: {}", error.description());
            if error == LinkStatus::ConnectionLost {
                state.connected = false;
            }
            // Every error code ends the session; `connected` follows
            // `connect_active` down.
            state.end_session();
            state.status = STATUS_ERROR;

            Dispatch {
                event: LinkEvent::LinkDown { status: error },
                hint: ReconnectHint::CallerMayRetry,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::STATUS_IDLE;
    use std::net::Ipv4Addr;

    fn connecting() -> LinkState {
        let mut state = LinkState::new();
        state.active = true;
        state.connect_active = true;
        state
    }

    fn netif_with(addr: Ipv4Addr) -> InterfaceRecord {
        let mut netif = InterfaceRecord::new("ppp0");
        netif.set_addresses(addr, Ipv4Addr::BROADCAST, Ipv4Addr::new(10, 0, 0, 1));
        netif
    }

    #[test]
    fn test_link_up_with_address() {
        let mut state = connecting();
        let out = dispatch(
            &mut state,
            LinkStatus::Connected,
            &netif_with(Ipv4Addr::new(10, 0, 0, 2)),
        );

        assert!(state.connected());
        assert_eq!(state.status(), STATUS_UP);
        assert_eq!(out.hint, ReconnectHint::None);
        assert!(matches!(out.event, LinkEvent::LinkUp { connected: true, .. }));
    }

    #[test]
    fn test_link_up_with_zero_address() {
        let mut state = connecting();
        dispatch(
            &mut state,
            LinkStatus::Connected,
            &netif_with(Ipv4Addr::UNSPECIFIED),
        );

        assert!(!state.connected());
        assert_eq!(state.status(), STATUS_UP);
    }

    #[test]
    fn test_user_close_sets_flag_once() {
        let mut state = connecting();
        let netif = InterfaceRecord::new("ppp0");

        let out = dispatch(&mut state, LinkStatus::User, &netif);
        assert!(state.clean_close());
        assert!(!state.connect_active());
        assert_eq!(out.hint, ReconnectHint::Stop);

        // Later statuses never lower it
        dispatch(&mut state, LinkStatus::User, &netif);
        dispatch(&mut state, LinkStatus::ConnectionLost, &netif);
        dispatch(&mut state, LinkStatus::Connected, &netif);
        assert!(state.clean_close());
        assert!(state.is_consistent());
    }

    #[test]
    fn test_user_close_without_session_leaves_flag_down() {
        let mut state = LinkState::new();
        state.active = true;
        dispatch(&mut state, LinkStatus::User, &InterfaceRecord::new("ppp0"));
        assert!(!state.clean_close());
    }

    #[test]
    fn test_connection_lost() {
        let mut state = connecting();
        let netif = netif_with(Ipv4Addr::new(10, 0, 0, 2));
        dispatch(&mut state, LinkStatus::Connected, &netif);

        let out = dispatch(&mut state, LinkStatus::ConnectionLost, &netif);
        assert!(!state.connected());
        assert!(!state.connect_active());
        assert_eq!(state.status(), STATUS_ERROR);
        assert_eq!(out.hint, ReconnectHint::CallerMayRetry);
    }

    #[test]
    fn test_every_error_code_flags_retry() {
        for code in [1, 2, 3, 4, 6, 7, 8, 9, 10, 11, 12] {
            let mut state = connecting();
            let out = dispatch(
                &mut state,
                LinkStatus::from_code(code),
                &InterfaceRecord::new("ppp0"),
            );
            assert_eq!(state.status(), STATUS_ERROR, "code {}", code);
            assert_eq!(out.hint, ReconnectHint::CallerMayRetry, "code {}", code);
            assert!(state.is_consistent());
        }
    }

    #[test]
    fn test_error_on_live_link_clears_connected() {
        let netif = netif_with(Ipv4Addr::new(10, 0, 0, 2));
        for code in [1, 2, 3, 4, 6, 7, 8, 9, 10, 11, 12] {
            let mut state = connecting();
            dispatch(&mut state, LinkStatus::Connected, &netif);
            assert!(state.connected());

            dispatch(&mut state, LinkStatus::from_code(code), &netif);
            assert!(!state.connected(), "code {}", code);
            assert!(!state.connect_active(), "code {}", code);
        }
    }

    #[test]
    fn test_unknown_code_changes_nothing() {
        let mut state = connecting();
        let out = dispatch(&mut state, LinkStatus::Unknown(77), &InterfaceRecord::new("ppp0"));

        assert_eq!(state.status(), STATUS_IDLE);
        assert!(state.connect_active());
        assert_eq!(out.event, LinkEvent::UnknownStatus { code: 77 });
        assert_eq!(out.hint, ReconnectHint::None);
    }
}

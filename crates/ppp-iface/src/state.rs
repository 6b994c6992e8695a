//! Interface and connection state tracking

use std::sync::atomic::{AtomicBool, Ordering};

/// Outward status: no link has come up yet
pub const STATUS_IDLE: i32 = 0;

/// Outward status: the link came up at least once
pub const STATUS_UP: i32 = 1;

/// Outward status: a link error was observed, the caller may reconnect
pub const STATUS_ERROR: i32 = -1;

/// Set once when a requested close completes
///
/// Written by the status dispatcher and read by the deactivation wait loop.
/// Stores use `Release` and loads use `Acquire` so the flag stays correct if
/// the status callback is ever delivered from another execution context.
#[derive(Debug, Default)]
pub struct CleanCloseFlag(AtomicBool);

impl CleanCloseFlag {
    /// Whether the close completed
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Raise the flag; returns false if it was already raised
    pub(crate) fn signal(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::Release, Ordering::Relaxed)
            .is_ok()
    }

    /// Lower the flag; only the owner (deactivation) may do this
    pub(crate) fn reset(&mut self) {
        *self.0.get_mut() = false;
    }
}

/// Connection state of an interface handle
///
/// Invariants held by every mutation in this crate:
/// - `connect_active` implies `active`
/// - `connected` implies `connect_active`
/// - the clean-close flag only rises while `connect_active`
#[derive(Debug, Default)]
pub struct LinkState {
    pub(crate) active: bool,
    pub(crate) connect_active: bool,
    pub(crate) connected: bool,
    pub(crate) clean_close: CleanCloseFlag,
    pub(crate) status: i32,
}

impl LinkState {
    /// Create the initial (inactive) state
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine exists and the interface is registered
    pub fn active(&self) -> bool {
        self.active
    }

    /// A connect was issued and the session has not ended
    pub fn connect_active(&self) -> bool {
        self.connect_active
    }

    /// Negotiation finished with a non-zero address
    pub fn connected(&self) -> bool {
        self.connected
    }

    /// A requested close has completed
    pub fn clean_close(&self) -> bool {
        self.clean_close.is_set()
    }

    /// Coarse outward status code
    pub fn status(&self) -> i32 {
        self.status
    }

    /// End the session (terminal status observed)
    pub(crate) fn end_session(&mut self) {
        self.connect_active = false;
        self.connected = false;
    }

    /// Return to the just-constructed flags, keeping the outward status
    pub(crate) fn reset(&mut self) {
        self.active = false;
        self.connect_active = false;
        self.connected = false;
        self.clean_close.reset();
    }

    /// Check the documented invariants
    pub fn is_consistent(&self) -> bool {
        (!self.connect_active || self.active)
            && (!self.connected || self.connect_active)
            && (!self.clean_close.is_set() || self.active)
    }

    /// Copy of the observable state
    pub fn snapshot(&self) -> LinkSnapshot {
        LinkSnapshot {
            active: self.active,
            connect_active: self.connect_active,
            connected: self.connected,
            clean_close: self.clean_close.is_set(),
            status: self.status,
        }
    }
}

/// Plain-data copy of [`LinkState`], cheap to send to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkSnapshot {
    /// See [`LinkState::active`]
    pub active: bool,
    /// See [`LinkState::connect_active`]
    pub connect_active: bool,
    /// See [`LinkState::connected`]
    pub connected: bool,
    /// See [`LinkState::clean_close`]
    pub clean_close: bool,
    /// See [`LinkState::status`]
    pub status: i32,
}

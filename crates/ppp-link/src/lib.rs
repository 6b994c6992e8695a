//! PPP Link Contracts
//!
//! This crate defines the collaborators a PPP-over-serial interface driver
//! consumes but does not implement:
//!
//! - **Link Protocol Engine**: the LCP/IPCP negotiation and HDLC-like framing
//!   implementation, reached through [`LinkEngine`] and created through an
//!   [`EngineFactory`]
//! - **Stream Adapter**: a duplex byte channel with short-timeout reads and
//!   writes ([`StreamAdapter`])
//! - **Clock**: a wrapping millisecond tick source used for bounded waits
//!   ([`Clock`])
//!
//! # Callbacks
//!
//! An engine never holds on to the driver. Every engine entry point that may
//! produce traffic or a phase transition receives a `&mut dyn LinkCallbacks`
//! for the duration of the call, and invokes it synchronously:
//!
//! ```rust
//! use ppp_link::{InterfaceRecord, LinkCallbacks, LinkStatus};
//!
//! struct Recorder {
//!     sent: Vec<u8>,
//!     statuses: Vec<LinkStatus>,
//! }
//!
//! impl LinkCallbacks for Recorder {
//!     fn output(&mut self, data: &[u8]) -> usize {
//!         self.sent.extend_from_slice(data);
//!         data.len()
//!     }
//!
//!     fn status(&mut self, status: LinkStatus, _netif: &InterfaceRecord) {
//!         self.statuses.push(status);
//!     }
//! }
//! ```

pub mod auth;
pub mod clock;
pub mod error;
pub mod hexdump;
pub mod netif;
pub mod status;
pub mod stream;

pub use auth::{AuthConfig, AuthMode};
pub use clock::{ticks_diff, Clock, MonotonicClock};
pub use error::EngineError;
pub use hexdump::xxd;
pub use netif::{IfConfig, InterfaceRecord};
pub use status::LinkStatus;
pub use stream::{is_timeout, StreamAdapter};

/// Sink for everything an engine reports back to its owner
///
/// Both methods run on the caller's stack, inside whichever engine call
/// triggered them.
pub trait LinkCallbacks {
    /// Transmit framed bytes, returning how many the stream accepted
    fn output(&mut self, data: &[u8]) -> usize;

    /// Report a phase transition together with the current interface record
    fn status(&mut self, status: LinkStatus, netif: &InterfaceRecord);
}

/// A PPP-over-serial protocol engine instance
///
/// Dropping the engine destroys it. The interface record belongs to the
/// engine and lives exactly as long as it does.
pub trait LinkEngine {
    /// The interface record this engine negotiates addresses into
    fn netif(&self) -> &InterfaceRecord;

    /// Mutable access to the interface record
    fn netif_mut(&mut self) -> &mut InterfaceRecord;

    /// Configure PAP/CHAP credentials for the next connect
    ///
    /// `None` clears any credentials left from an earlier connect.
    fn set_auth(&mut self, auth: Option<&AuthConfig>);

    /// Accept DNS servers offered by the peer during IPCP
    fn set_use_peer_dns(&mut self, enabled: bool);

    /// Start negotiation after `holdoff_secs`
    fn connect(
        &mut self,
        holdoff_secs: u16,
        callbacks: &mut dyn LinkCallbacks,
    ) -> Result<(), EngineError>;

    /// Request termination of the link
    ///
    /// Completion is reported later through [`LinkStatus::User`].
    fn close(
        &mut self,
        no_carrier: bool,
        callbacks: &mut dyn LinkCallbacks,
    ) -> Result<(), EngineError>;

    /// Feed bytes received from the stream
    fn input(&mut self, data: &[u8], callbacks: &mut dyn LinkCallbacks);
}

/// Creates engine instances on interface activation
pub trait EngineFactory {
    /// The engine type produced by this factory
    type Engine: LinkEngine;

    /// Create a fresh engine with its own interface record
    fn create(&self) -> Result<Self::Engine, EngineError>;
}

//! PPP Interface Lifecycle Manager
//!
//! This crate exposes a point-to-point network interface carried over a
//! byte stream (usually a serial port to a modem) and manages its life:
//! activation, connect with optional PAP/CHAP credentials, cooperative
//! polling, link-status tracking and bounded graceful shutdown.
//!
//! # Architecture
//!
//! The negotiation itself belongs to a link engine reached through the
//! [`ppp_link::LinkEngine`] trait. The handle sits between that engine and
//! the stream:
//!
//! - **Interface Handle** ([`PppInterface`]): owns the engine while active
//!   and sequences `set_active`, `connect`, `poll` and queries
//! - **Status Dispatcher** ([`dispatcher`]): turns engine status callbacks
//!   into state transitions and [`LinkEvent`]s
//! - **Output Path**: writes engine output to the stream once per callback,
//!   with no retry on a short write
//! - **Supervisor** ([`Supervisor`]): optional reconnect loop with
//!   exponential backoff, since the handle never reconnects by itself
//!
//! # Single-threaded Driving
//!
//! Nothing runs in the background. Status callbacks and output writes happen
//! inside `poll`, `connect` and `set_active(false)`, on the caller's thread.
//!
//! # Example
//!
//! ```rust
//! use ppp_iface::{ConnectOptions, PppInterface};
//! use ppp_sim::{MemoryStream, SimEngineFactory};
//!
//! let (stream, peer) = MemoryStream::pair();
//! let mut iface = PppInterface::new(stream, SimEngineFactory::new());
//!
//! iface.set_active(true)?;
//! iface.connect(&ConnectOptions::new())?;
//!
//! peer.send_frame("UP 10.0.0.2 10.0.0.1");
//! iface.poll()?;
//! assert!(iface.is_connected());
//! assert_eq!(iface.status(), 1);
//! # Ok::<(), ppp_iface::PppError>(())
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod interface;
pub mod serial;
pub mod state;
pub mod supervisor;
pub mod trace;

pub use config::InterfaceConfig;
pub use dispatcher::{dispatch, Dispatch, ReconnectHint};
pub use error::PppError;
pub use events::LinkEvent;
pub use interface::{ConnectOptions, PppInterface};
pub use serial::SerialStream;
pub use state::{LinkSnapshot, LinkState, STATUS_ERROR, STATUS_IDLE, STATUS_UP};
pub use supervisor::{ReconnectPolicy, Supervisor, SupervisorAction};
pub use trace::{Direction, MemorySink, TraceRecord, TraceSink, TracingSink};

//! PPP Link Simulation Library
//!
//! This crate provides a simulation layer for exercising PPP interface
//! handles without a modem or a real protocol stack. It includes:
//!
//! - **MemoryStream**: an in-memory duplex stream with a peer-side handle
//! - **SimEngine**: a scripted link engine that speaks a tiny flag-delimited
//!   text protocol and records every call into a shared [`SimProbe`]
//! - **ManualClock**: a tick source that only moves when told to (or when
//!   someone sleeps on it)
//! - **SimPeer**: the remote end of the link, answering negotiation and
//!   termination requests and optionally dropping the link
//!
//! # Example
//!
//! ```rust
//! use ppp_link::{EngineFactory, LinkEngine};
//! use ppp_sim::{MemoryStream, SimEngineFactory};
//!
//! let (_stream, peer) = MemoryStream::pair();
//! let factory = SimEngineFactory::new();
//! let probe = factory.probe();
//!
//! let engine = factory.create().unwrap();
//! assert_eq!(probe.created(), 1);
//! drop(engine);
//! assert_eq!(probe.destroyed(), 1);
//!
//! peer.send_frame("UP 10.0.0.2 10.0.0.1");
//! ```

pub mod clock;
pub mod engine;
pub mod frame;
pub mod peer;
pub mod stream;

pub use clock::ManualClock;
pub use engine::{SimEngine, SimEngineFactory, SimProbe};
pub use frame::{encode_frame, FrameDecoder, FLAG};
pub use peer::{SimPeer, SimPeerConfig};
pub use stream::{MemoryPeer, MemoryStream};

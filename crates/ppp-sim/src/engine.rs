//! Scripted link engine
//!
//! [`SimEngine`] stands in for a real PPP stack. It keeps a coarse phase,
//! speaks the flag-delimited text protocol from [`crate::frame`], and records
//! every call into a [`SimProbe`] that outlives the engine so tests can
//! inspect what the driver did after the engine has been destroyed.
//!
//! Commands the engine sends:
//!
//! | Frame | Meaning |
//! |---|---|
//! | `CONFREQ <auth>` | negotiation start, `auth` is `none`, `PAP` or `CHAP` |
//! | `TERMREQ` | local close request |
//! | `TERMACK` | answer to a peer `TERMREQ` |
//! | `ECHOREP` | answer to `ECHOREQ` |
//!
//! Commands the engine understands:
//!
//! | Frame | Effect |
//! |---|---|
//! | `UP <addr> <gw> [dns1] [dns2]` | link up with the given addresses |
//! | `TERMACK` | completes a local close, reports `User` |
//! | `TERMREQ` | peer hangs up, reports `ConnectionLost` |
//! | `DOWN <code>` | session ends with status `code` |
//! | `STATUS <code>` | reports `code` without touching the phase |
//! | `ECHOREQ` | answered with `ECHOREP` |
//!
//! [`SimProbe::set_connect_reply`] makes the engine handle one of these frames
//! from inside `connect`, the way a stack that answers from a cache or fails
//! on the first write reports a status before `connect` returns.

use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, MutexGuard};

use ppp_link::{
    AuthConfig, EngineError, EngineFactory, InterfaceRecord, LinkCallbacks, LinkEngine,
    LinkStatus,
};
use tracing::debug;

use crate::frame::{encode_frame, FrameDecoder};

/// Coarse engine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimPhase {
    /// No session
    Dead,
    /// Negotiating
    Establish,
    /// Link up
    Running,
    /// Waiting for the peer to acknowledge a close
    Terminating,
}

impl SimPhase {
    fn name(&self) -> &'static str {
        match self {
            Self::Dead => "dead",
            Self::Establish => "establish",
            Self::Running => "running",
            Self::Terminating => "terminating",
        }
    }
}

#[derive(Debug, Default)]
struct ProbeState {
    created: usize,
    destroyed: usize,
    fail_create: bool,
    fail_connect: bool,
    inputs: Vec<Vec<u8>>,
    connect_calls: usize,
    close_calls: usize,
    auth: Option<AuthConfig>,
    use_peer_dns: bool,
    default_route_at_connect: Option<bool>,
    connect_reply: Option<String>,
    statuses: Vec<LinkStatus>,
}

/// Shared record of everything the simulated engines did
#[derive(Debug, Clone, Default)]
pub struct SimProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl SimProbe {
    fn lock(&self) -> MutexGuard<'_, ProbeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Engines created
    pub fn created(&self) -> usize {
        self.lock().created
    }

    /// Engines dropped
    pub fn destroyed(&self) -> usize {
        self.lock().destroyed
    }

    /// Engines currently alive
    pub fn live(&self) -> usize {
        let state = self.lock();
        state.created - state.destroyed
    }

    /// Make the next `create` calls fail with an allocation error
    pub fn set_fail_create(&self, fail: bool) {
        self.lock().fail_create = fail;
    }

    /// Make `connect` calls fail
    pub fn set_fail_connect(&self, fail: bool) {
        self.lock().fail_connect = fail;
    }

    /// Handle `frame` synchronously inside every subsequent `connect`
    pub fn set_connect_reply(&self, frame: Option<&str>) {
        self.lock().connect_reply = frame.map(str::to_string);
    }

    /// Every chunk passed to `input`, in order
    pub fn inputs(&self) -> Vec<Vec<u8>> {
        self.lock().inputs.clone()
    }

    /// Number of `input` calls
    pub fn input_calls(&self) -> usize {
        self.lock().inputs.len()
    }

    /// Number of `connect` calls, including failed ones
    pub fn connect_calls(&self) -> usize {
        self.lock().connect_calls
    }

    /// Number of `close` calls
    pub fn close_calls(&self) -> usize {
        self.lock().close_calls
    }

    /// Credentials most recently configured
    pub fn auth(&self) -> Option<AuthConfig> {
        self.lock().auth.clone()
    }

    /// Whether peer DNS was enabled
    pub fn use_peer_dns(&self) -> bool {
        self.lock().use_peer_dns
    }

    /// Default-route flag observed on the interface record at the last connect
    pub fn default_route_at_connect(&self) -> Option<bool> {
        self.lock().default_route_at_connect
    }

    /// Every status reported by any engine
    pub fn statuses(&self) -> Vec<LinkStatus> {
        self.lock().statuses.clone()
    }
}

/// Scripted link engine
pub struct SimEngine {
    netif: InterfaceRecord,
    phase: SimPhase,
    decoder: FrameDecoder,
    auth: Option<AuthConfig>,
    use_peer_dns: bool,
    probe: SimProbe,
}

impl SimEngine {
    /// Current phase
    pub fn phase(&self) -> SimPhase {
        self.phase
    }

    fn send(&self, payload: &str, callbacks: &mut dyn LinkCallbacks) {
        let frame = encode_frame(payload);
        let written = callbacks.output(&frame);
        if written < frame.len() {
            debug!("sim engine short write: {}/{} bytes", written, frame.len());
        }
    }

    fn report(&mut self, status: LinkStatus, callbacks: &mut dyn LinkCallbacks) {
        self.probe.lock().statuses.push(status);
        callbacks.status(status, &self.netif);
    }

    fn end_session(&mut self, status: LinkStatus, callbacks: &mut dyn LinkCallbacks) {
        self.netif.clear_addresses();
        self.phase = SimPhase::Dead;
        self.report(status, callbacks);
    }

    fn handle_frame(&mut self, frame: &str, callbacks: &mut dyn LinkCallbacks) {
        let mut parts = frame.split_whitespace();
        let command = parts.next().unwrap_or_default();
        match (command, self.phase) {
            ("UP", SimPhase::Establish) => {
                let mut addrs = parts.filter_map(|p| p.parse::<Ipv4Addr>().ok());
                let addr = addrs.next().unwrap_or(Ipv4Addr::UNSPECIFIED);
                let gateway = addrs.next().unwrap_or(Ipv4Addr::UNSPECIFIED);
                self.netif
                    .set_addresses(addr, Ipv4Addr::new(255, 255, 255, 255), gateway);
                if self.use_peer_dns {
                    for (index, server) in addrs.take(2).enumerate() {
                        self.netif.set_dns(index, server);
                    }
                }
                self.phase = SimPhase::Running;
                self.report(LinkStatus::Connected, callbacks);
            }
            ("TERMACK", SimPhase::Terminating) => {
                self.end_session(LinkStatus::User, callbacks);
            }
            ("TERMREQ", SimPhase::Establish | SimPhase::Running) => {
                self.send("TERMACK", callbacks);
                self.end_session(LinkStatus::ConnectionLost, callbacks);
            }
            ("DOWN", phase) if phase != SimPhase::Dead => {
                let code = parts.next().and_then(|c| c.parse().ok()).unwrap_or(6);
                self.end_session(LinkStatus::from_code(code), callbacks);
            }
            ("STATUS", _) => {
                if let Some(code) = parts.next().and_then(|c| c.parse().ok()) {
                    self.report(LinkStatus::from_code(code), callbacks);
                }
            }
            ("ECHOREQ", SimPhase::Running) => self.send("ECHOREP", callbacks),
            (other, phase) => {
                debug!("sim engine ignoring {:?} in phase {}", other, phase.name());
            }
        }
    }
}

impl LinkEngine for SimEngine {
    fn netif(&self) -> &InterfaceRecord {
        &self.netif
    }

    fn netif_mut(&mut self) -> &mut InterfaceRecord {
        &mut self.netif
    }

    fn set_auth(&mut self, auth: Option<&AuthConfig>) {
        self.auth = auth.cloned();
        self.probe.lock().auth = auth.cloned();
    }

    fn set_use_peer_dns(&mut self, enabled: bool) {
        self.use_peer_dns = enabled;
        self.probe.lock().use_peer_dns = enabled;
    }

    fn connect(
        &mut self,
        _holdoff_secs: u16,
        callbacks: &mut dyn LinkCallbacks,
    ) -> Result<(), EngineError> {
        {
            let mut probe = self.probe.lock();
            probe.connect_calls += 1;
            probe.default_route_at_connect = Some(self.netif.is_default());
            if probe.fail_connect {
                return Err(EngineError::Device("simulated connect failure".into()));
            }
        }
        if self.phase != SimPhase::Dead {
            return Err(EngineError::WrongPhase {
                phase: self.phase.name(),
            });
        }

        self.phase = SimPhase::Establish;
        let auth = self.auth.as_ref().map_or("none", |a| a.mode.name());
        self.send(&format!("CONFREQ {}", auth), callbacks);

        let reply = self.probe.lock().connect_reply.clone();
        if let Some(frame) = reply {
            self.handle_frame(&frame, callbacks);
        }
        Ok(())
    }

    fn close(
        &mut self,
        _no_carrier: bool,
        callbacks: &mut dyn LinkCallbacks,
    ) -> Result<(), EngineError> {
        self.probe.lock().close_calls += 1;
        match self.phase {
            SimPhase::Dead => self.report(LinkStatus::User, callbacks),
            SimPhase::Terminating => {}
            SimPhase::Establish | SimPhase::Running => {
                self.phase = SimPhase::Terminating;
                self.send("TERMREQ", callbacks);
            }
        }
        Ok(())
    }

    fn input(&mut self, data: &[u8], callbacks: &mut dyn LinkCallbacks) {
        self.probe.lock().inputs.push(data.to_vec());
        for frame in self.decoder.push(data) {
            self.handle_frame(&frame, callbacks);
        }
    }
}

impl Drop for SimEngine {
    fn drop(&mut self) {
        self.probe.lock().destroyed += 1;
    }
}

/// Factory producing [`SimEngine`]s that share one probe
#[derive(Debug, Clone)]
pub struct SimEngineFactory {
    netif_name: String,
    probe: SimProbe,
}

impl SimEngineFactory {
    /// Create a factory for `ppp0`
    pub fn new() -> Self {
        Self::with_netif_name("ppp0")
    }

    /// Create a factory whose engines use the given interface name
    pub fn with_netif_name(name: impl Into<String>) -> Self {
        Self {
            netif_name: name.into(),
            probe: SimProbe::default(),
        }
    }

    /// Handle for inspecting and steering the engines
    pub fn probe(&self) -> SimProbe {
        self.probe.clone()
    }
}

impl Default for SimEngineFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineFactory for SimEngineFactory {
    type Engine = SimEngine;

    fn create(&self) -> Result<SimEngine, EngineError> {
        {
            let mut probe = self.probe.lock();
            if probe.fail_create {
                return Err(EngineError::Alloc);
            }
            probe.created += 1;
        }
        Ok(SimEngine {
            netif: InterfaceRecord::new(self.netif_name.clone()),
            phase: SimPhase::Dead,
            decoder: FrameDecoder::new(),
            auth: None,
            use_peer_dns: false,
            probe: self.probe.clone(),
        })
    }
}

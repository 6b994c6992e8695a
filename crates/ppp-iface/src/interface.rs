//! PPP interface handle
//!
//! [`PppInterface`] owns a link engine while active, borrows or owns the
//! stream carrying the link, and sequences activation, connect, poll and
//! deactivation.
//!
//! There is no background thread. Everything happens inside the caller's
//! calls: `poll` reads a chunk and feeds it to the engine, and the engine's
//! output and status callbacks run reentrantly inside that same call.

use std::fmt;
use std::time::Duration;

use ppp_link::{
    is_timeout, ticks_diff, AuthConfig, AuthMode, Clock, EngineFactory, IfConfig,
    InterfaceRecord, LinkCallbacks, LinkEngine, LinkStatus, MonotonicClock, StreamAdapter,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::InterfaceConfig;
use crate::dispatcher::dispatch;
use crate::error::PppError;
use crate::events::LinkEvent;
use crate::state::{LinkSnapshot, LinkState};
use crate::trace::{Direction, TraceSink};

type BoxedSink = Box<dyn TraceSink + Send>;

/// Arguments for [`PppInterface::connect`]
///
/// `authmode` is kept as the raw code so an unrecognized mode is reported by
/// connect itself, after the precondition checks.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectOptions {
    /// Raw auth mode, see [`AuthMode::NONE`], [`AuthMode::PAP`], [`AuthMode::CHAP`]
    pub authmode: u32,
    /// Username, required for PAP and CHAP
    pub username: Option<String>,
    /// Password, required for PAP and CHAP
    pub password: Option<String>,
}

impl ConnectOptions {
    /// Connect without authentication
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect with PAP
    pub fn pap(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::with_credentials(AuthMode::Pap, username, password)
    }

    /// Connect with CHAP
    pub fn chap(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::with_credentials(AuthMode::Chap, username, password)
    }

    fn with_credentials(
        mode: AuthMode,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            authmode: mode.code(),
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// Override the raw auth mode
    pub fn with_authmode(mut self, authmode: u32) -> Self {
        self.authmode = authmode;
        self
    }

    /// Validate the options into the engine's auth configuration
    ///
    /// Returns `None` for [`AuthMode::None`].
    pub fn auth_config(&self) -> Result<Option<AuthConfig>, PppError> {
        let mode = AuthMode::from_code(self.authmode).ok_or(PppError::InvalidAuth(self.authmode))?;
        if !mode.requires_credentials() {
            return Ok(None);
        }

        let username = non_empty(&self.username).ok_or(PppError::MissingCredentials {
            mode,
            field: "username",
        })?;
        let password = non_empty(&self.password).ok_or(PppError::MissingCredentials {
            mode,
            field: "password",
        })?;
        Ok(Some(AuthConfig::new(mode, username, password)))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("authmode", &self.authmode)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Callbacks handed to the engine for the duration of one engine call
struct HandleCallbacks<'a, S, C> {
    stream: &'a mut S,
    state: &'a mut LinkState,
    events: &'a mut Vec<LinkEvent>,
    trace: Option<&'a mut BoxedSink>,
    clock: &'a C,
    write_timeout: Duration,
}

impl<S: StreamAdapter, C: Clock> LinkCallbacks for HandleCallbacks<'_, S, C> {
    fn output(&mut self, data: &[u8]) -> usize {
        if let Some(sink) = self.trace.as_mut() {
            sink.record(Direction::Out, self.clock.ticks_ms(), data);
        }
        match self.stream.write(data, self.write_timeout) {
            Ok(n) => {
                if n < data.len() {
                    debug!("short write: {}/{} bytes", n, data.len());
                }
                n
            }
            Err(e) => {
                warn!("PPP output write failed: {}", e);
                0
            }
        }
    }

    fn status(&mut self, status: LinkStatus, netif: &InterfaceRecord) {
        let outcome = dispatch(self.state, status, netif);
        debug!("status {} -> {:?}", status.code(), outcome.hint);
        self.events.push(outcome.event);
    }
}

/// A point-to-point network interface over a byte stream
pub struct PppInterface<S, F, C = MonotonicClock>
where
    F: EngineFactory,
{
    stream: S,
    factory: F,
    clock: C,
    config: InterfaceConfig,
    engine: Option<F::Engine>,
    state: LinkState,
    trace: Option<BoxedSink>,
    events: Vec<LinkEvent>,
    read_buf: Vec<u8>,
}

impl<S, F> PppInterface<S, F, MonotonicClock>
where
    S: StreamAdapter,
    F: EngineFactory,
{
    /// Create an inactive interface with default configuration
    pub fn new(stream: S, factory: F) -> Self {
        Self::with_parts(stream, factory, MonotonicClock::new(), InterfaceConfig::default())
    }
}

impl<S, F, C> PppInterface<S, F, C>
where
    S: StreamAdapter,
    F: EngineFactory,
    C: Clock,
{
    /// Create an inactive interface with an explicit clock and configuration
    ///
    /// An out-of-range configuration is replaced by the defaults.
    pub fn with_parts(stream: S, factory: F, clock: C, config: InterfaceConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                warn!("ignoring interface config: {}", e);
                InterfaceConfig::default()
            }
        };
        let read_buf = vec![0u8; config.poll_chunk as usize];
        Self {
            stream,
            factory,
            clock,
            config,
            engine: None,
            state: LinkState::new(),
            trace: None,
            events: Vec::new(),
            read_buf,
        }
    }

    /// Install a frame trace sink
    pub fn set_trace_sink(&mut self, sink: impl TraceSink + Send + 'static) {
        self.trace = Some(Box::new(sink));
    }

    /// Remove the frame trace sink
    pub fn clear_trace_sink(&mut self) {
        self.trace = None;
    }

    // -------------------------------------------------------------------------
    // Activation
    // -------------------------------------------------------------------------

    /// Whether the engine exists
    pub fn active(&self) -> bool {
        self.state.active
    }

    /// Activate or deactivate, returning the resulting active state
    pub fn set_active(&mut self, active: bool) -> Result<bool, PppError> {
        if active {
            self.activate()?;
        } else {
            self.deactivate();
        }
        Ok(self.state.active)
    }

    fn activate(&mut self) -> Result<(), PppError> {
        if self.state.active {
            return Ok(());
        }

        let engine = self.factory.create().map_err(|e| {
            warn!("engine creation failed: {}", e);
            PppError::ResourceInit(e)
        })?;
        info!("Activated {}", engine.netif().name());

        self.engine = Some(engine);
        self.state.active = true;
        self.events.push(LinkEvent::Activated);
        Ok(())
    }

    fn deactivate(&mut self) {
        if !self.state.active {
            return;
        }

        let mut clean_close = false;
        if self.state.connect_active {
            clean_close = self.close_and_wait();
        }

        // Dropping the engine destroys it together with its interface record.
        if let Some(engine) = self.engine.take() {
            info!("Released {}", engine.netif().name());
        }
        self.state.reset();
        self.events.push(LinkEvent::Deactivated { clean_close });
    }

    /// Request a close and pump the link until it completes or times out
    fn close_and_wait(&mut self) -> bool {
        let write_timeout = self.config.write_timeout();
        let Some(engine) = self.engine.as_mut() else {
            return false;
        };
        // The deadline runs from the close request, including its write.
        let t0 = self.clock.ticks_ms();
        let mut callbacks = HandleCallbacks {
            stream: &mut self.stream,
            state: &mut self.state,
            events: &mut self.events,
            trace: self.trace.as_mut(),
            clock: &self.clock,
            write_timeout,
        };
        if let Err(e) = engine.close(false, &mut callbacks) {
            warn!("close request rejected: {}", e);
            return self.state.clean_close.is_set();
        }

        let timeout_ms = self.config.close_timeout_ms;
        while !self.state.clean_close.is_set()
            && ticks_diff(self.clock.ticks_ms(), t0) < timeout_ms
        {
            if let Err(e) = self.pump() {
                debug!("poll during close failed: {}", e);
            }
            self.clock.sleep(self.config.close_poll_interval());
        }

        let clean = self.state.clean_close.is_set();
        if !clean {
            let waited_ms = ticks_diff(self.clock.ticks_ms(), t0);
            warn!("no clean close after {}ms, tearing down anyway", waited_ms);
            self.events.push(LinkEvent::CloseTimedOut { waited_ms });
        }
        clean
    }

    // -------------------------------------------------------------------------
    // Connect
    // -------------------------------------------------------------------------

    /// Start negotiation
    ///
    /// Returns as soon as the engine has accepted the request; completion is
    /// observed later through [`poll`](Self::poll), [`status`](Self::status)
    /// and [`is_connected`](Self::is_connected).
    pub fn connect(&mut self, options: &ConnectOptions) -> Result<(), PppError> {
        if !self.state.active {
            return Err(PppError::NotActive);
        }
        if self.state.connect_active {
            return Err(PppError::AlreadyInProgress);
        }
        let auth = options.auth_config()?;

        let write_timeout = self.config.write_timeout();
        let Some(engine) = self.engine.as_mut() else {
            return Err(PppError::NotActive);
        };

        engine.set_auth(auth.as_ref());
        engine.netif_mut().set_default(true);
        engine.set_use_peer_dns(true);

        let mode = auth.as_ref().map_or(AuthMode::None, |a| a.mode);
        info!("Connecting {} (auth {})", engine.netif().name(), mode);

        // The engine may report a status before connect returns, so the
        // session must already be marked in progress.
        self.state.connect_active = true;
        let requested_at = self.events.len();
        self.events.push(LinkEvent::ConnectRequested { auth: mode });

        let mut callbacks = HandleCallbacks {
            stream: &mut self.stream,
            state: &mut self.state,
            events: &mut self.events,
            trace: self.trace.as_mut(),
            clock: &self.clock,
            write_timeout,
        };
        if let Err(e) = engine.connect(0, &mut callbacks) {
            warn!("connect failed: {}", e);
            self.state.end_session();
            self.events.remove(requested_at);
            return Err(PppError::ConnectFailed(e));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Poll
    // -------------------------------------------------------------------------

    /// Read one chunk from the stream and feed it to the engine
    ///
    /// Returns the number of bytes read, 0 when nothing was available.
    pub fn poll(&mut self) -> Result<usize, PppError> {
        if !self.state.active {
            return Err(PppError::NotActive);
        }
        self.pump()
    }

    fn pump(&mut self) -> Result<usize, PppError> {
        let write_timeout = self.config.write_timeout();
        let Some(engine) = self.engine.as_mut() else {
            return Ok(0);
        };

        let n = match self.stream.read(&mut self.read_buf, self.config.read_timeout()) {
            Ok(n) => n,
            Err(e) if is_timeout(&e) => 0,
            Err(e) => return Err(e.into()),
        };
        if n == 0 {
            return Ok(0);
        }

        let data = &self.read_buf[..n];
        if let Some(sink) = self.trace.as_mut() {
            sink.record(Direction::In, self.clock.ticks_ms(), data);
        }
        let mut callbacks = HandleCallbacks {
            stream: &mut self.stream,
            state: &mut self.state,
            events: &mut self.events,
            trace: self.trace.as_mut(),
            clock: &self.clock,
            write_timeout,
        };
        engine.input(data, &mut callbacks);
        Ok(n)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Negotiation finished with a usable address
    pub fn is_connected(&self) -> bool {
        self.state.connected
    }

    /// A connect is pending or established
    pub fn connect_active(&self) -> bool {
        self.state.connect_active
    }

    /// Coarse status: 0 never connected, 1 connected at least once, -1 link error
    pub fn status(&self) -> i32 {
        self.state.status
    }

    /// Copy of all state flags
    pub fn snapshot(&self) -> LinkSnapshot {
        self.state.snapshot()
    }

    /// Borrow the full state
    pub fn state(&self) -> &LinkState {
        &self.state
    }

    /// Take all buffered events
    pub fn drain_events(&mut self) -> Vec<LinkEvent> {
        std::mem::take(&mut self.events)
    }

    /// The clock driving timeouts
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The interface record, while active
    pub fn netif(&self) -> Option<&InterfaceRecord> {
        self.engine.as_ref().map(|e| e.netif())
    }

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------

    /// Current address configuration
    pub fn ifconfig(&self) -> Result<IfConfig, PppError> {
        self.netif().map(|n| n.ifconfig()).ok_or(PppError::NotActive)
    }

    /// Overwrite the address configuration
    pub fn set_ifconfig(&mut self, config: &IfConfig) -> Result<(), PppError> {
        let engine = self.engine.as_mut().ok_or(PppError::NotActive)?;
        engine.netif_mut().set_ifconfig(config);
        Ok(())
    }

    /// Interface tuning
    pub fn config(&self) -> &InterfaceConfig {
        &self.config
    }

    /// Read a tuning parameter by name
    pub fn config_get(&self, key: &str) -> Result<u32, PppError> {
        self.config.get(key)
    }

    /// Write a tuning parameter by name
    pub fn config_set(&mut self, key: &str, value: u32) -> Result<(), PppError> {
        self.config.set(key, value)?;
        self.read_buf.resize(self.config.poll_chunk as usize, 0);
        Ok(())
    }
}

impl<S, F, C> Drop for PppInterface<S, F, C>
where
    F: EngineFactory,
{
    fn drop(&mut self) {
        if let Some(engine) = self.engine.take() {
            debug!("Dropping active {} without a close", engine.netif().name());
        }
    }
}

impl<S, F, C> fmt::Debug for PppInterface<S, F, C>
where
    F: EngineFactory,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PppInterface")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("engine", &self.engine.as_ref().map(|_| "<engine>"))
            .field("trace", &self.trace.as_ref().map(|_| "<sink>"))
            .field("pending_events", &self.events.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppp_sim::{ManualClock, MemoryPeer, MemoryStream, SimEngineFactory, SimProbe};
    use std::net::Ipv4Addr;

    type TestIface = PppInterface<MemoryStream, SimEngineFactory, ManualClock>;

    fn setup() -> (TestIface, MemoryPeer, SimProbe, ManualClock) {
        let (stream, peer) = MemoryStream::pair();
        let factory = SimEngineFactory::new();
        let probe = factory.probe();
        let clock = ManualClock::new();
        let iface =
            PppInterface::with_parts(stream, factory, clock.clone(), InterfaceConfig::default());
        (iface, peer, probe, clock)
    }

    #[test]
    fn test_options_validation() {
        assert!(ConnectOptions::new().auth_config().unwrap().is_none());

        let auth = ConnectOptions::chap("u", "p").auth_config().unwrap().unwrap();
        assert_eq!(auth.mode, AuthMode::Chap);

        assert!(matches!(
            ConnectOptions::new().with_authmode(99).auth_config(),
            Err(PppError::InvalidAuth(99))
        ));
        assert!(matches!(
            ConnectOptions::pap("", "x").auth_config(),
            Err(PppError::MissingCredentials { field: "username", .. })
        ));
        assert!(matches!(
            ConnectOptions::pap("u", "").auth_config(),
            Err(PppError::MissingCredentials { field: "password", .. })
        ));
        assert!(matches!(
            ConnectOptions::new().with_authmode(AuthMode::PAP).auth_config(),
            Err(PppError::MissingCredentials { .. })
        ));
    }

    #[test]
    fn test_options_debug_redacts_password() {
        let rendered = format!("{:?}", ConnectOptions::pap("alice", "s3cret"));
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn test_activate_is_idempotent() {
        let (mut iface, _peer, probe, _clock) = setup();
        assert!(iface.set_active(true).unwrap());
        assert!(iface.set_active(true).unwrap());
        assert_eq!(probe.created(), 1);
        assert_eq!(iface.drain_events(), vec![LinkEvent::Activated]);
    }

    #[test]
    fn test_deactivate_when_inactive_is_noop() {
        let (mut iface, _peer, probe, _clock) = setup();
        assert!(!iface.set_active(false).unwrap());
        assert_eq!(probe.created(), 0);
        assert!(iface.drain_events().is_empty());
    }

    #[test]
    fn test_activation_failure_leaves_state_untouched() {
        let (mut iface, _peer, probe, _clock) = setup();
        probe.set_fail_create(true);

        assert!(matches!(
            iface.set_active(true),
            Err(PppError::ResourceInit(_))
        ));
        assert_eq!(iface.snapshot(), LinkSnapshot::default());
        assert!(iface.netif().is_none());

        probe.set_fail_create(false);
        assert!(iface.set_active(true).unwrap());
    }

    #[test]
    fn test_connect_configures_engine() {
        let (mut iface, peer, probe, _clock) = setup();
        iface.set_active(true).unwrap();
        iface.connect(&ConnectOptions::pap("user", "pw")).unwrap();

        assert!(iface.connect_active());
        assert!(!iface.is_connected());
        assert_eq!(probe.default_route_at_connect(), Some(true));
        assert!(probe.use_peer_dns());
        assert_eq!(probe.auth().map(|a| a.username), Some("user".to_string()));
        assert_eq!(peer.take_frames(), vec!["CONFREQ PAP"]);
    }

    #[test]
    fn test_connect_failure_keeps_engine() {
        let (mut iface, _peer, probe, _clock) = setup();
        iface.set_active(true).unwrap();
        probe.set_fail_connect(true);

        assert!(matches!(
            iface.connect(&ConnectOptions::new()),
            Err(PppError::ConnectFailed(_))
        ));
        assert!(!iface.connect_active());
        assert!(iface.active());
        assert_eq!(probe.live(), 1);
    }

    #[test]
    fn test_poll_inactive() {
        let (mut iface, _peer, _probe, _clock) = setup();
        assert!(matches!(iface.poll(), Err(PppError::NotActive)));
    }

    #[test]
    fn test_poll_read_error_propagates() {
        let (mut iface, peer, probe, _clock) = setup();
        iface.set_active(true).unwrap();
        peer.fail_next_read(std::io::ErrorKind::BrokenPipe);

        assert!(matches!(iface.poll(), Err(PppError::Io(_))));
        assert_eq!(probe.input_calls(), 0);

        peer.fail_next_read(std::io::ErrorKind::TimedOut);
        assert_eq!(iface.poll().unwrap(), 0);
    }

    #[test]
    fn test_poll_respects_chunk_size() {
        let (mut iface, peer, probe, _clock) = setup();
        iface.set_active(true).unwrap();
        iface.config_set("poll_chunk", 4).unwrap();
        peer.send(b"0123456789");

        assert_eq!(iface.poll().unwrap(), 4);
        assert_eq!(iface.poll().unwrap(), 4);
        assert_eq!(iface.poll().unwrap(), 2);
        assert_eq!(iface.poll().unwrap(), 0);
        assert_eq!(probe.input_calls(), 3);
    }

    #[test]
    fn test_ifconfig_passthrough() {
        let (mut iface, _peer, _probe, _clock) = setup();
        assert!(matches!(iface.ifconfig(), Err(PppError::NotActive)));

        iface.set_active(true).unwrap();
        let config = IfConfig {
            addr: Ipv4Addr::new(192, 168, 0, 2),
            netmask: Ipv4Addr::new(255, 255, 255, 0),
            gateway: Ipv4Addr::new(192, 168, 0, 1),
            dns: Ipv4Addr::new(192, 168, 0, 1),
        };
        iface.set_ifconfig(&config).unwrap();
        assert_eq!(iface.ifconfig().unwrap(), config);
    }

    #[test]
    fn test_silent_peer_close_times_out() {
        let (mut iface, _peer, probe, clock) = setup();
        iface.set_active(true).unwrap();
        iface.connect(&ConnectOptions::new()).unwrap();
        iface.drain_events();

        assert!(!iface.set_active(false).unwrap());
        assert_eq!(probe.close_calls(), 1);
        assert_eq!(clock.ticks_ms(), 4000);
        assert_eq!(probe.live(), 0);
        assert_eq!(
            iface.drain_events(),
            vec![
                LinkEvent::CloseTimedOut { waited_ms: 4000 },
                LinkEvent::Deactivated { clean_close: false },
            ]
        );
    }

    #[test]
    fn test_peer_hangup_skips_close_wait() {
        let (mut iface, peer, probe, clock) = setup();
        iface.set_active(true).unwrap();
        iface.connect(&ConnectOptions::new()).unwrap();
        peer.send_frame("TERMREQ");
        iface.poll().unwrap();
        assert!(!iface.connect_active());

        iface.set_active(false).unwrap();
        assert_eq!(probe.close_calls(), 0);
        assert_eq!(clock.sleep_count(), 0);
    }

    #[test]
    fn test_drop_releases_engine() {
        let (mut iface, _peer, probe, _clock) = setup();
        iface.set_active(true).unwrap();
        iface.connect(&ConnectOptions::new()).unwrap();
        drop(iface);
        assert_eq!(probe.live(), 0);
        assert_eq!(probe.close_calls(), 0);
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let (stream, _peer) = MemoryStream::pair();
        let config = InterfaceConfig {
            poll_chunk: 0,
            ..Default::default()
        };
        let iface = PppInterface::with_parts(
            stream,
            SimEngineFactory::new(),
            ManualClock::new(),
            config,
        );
        assert_eq!(iface.config().poll_chunk, 256);
    }
}

//! Supervised session against a simulated peer
//!
//! The interface handle and its supervisor run on one blocking thread; the
//! simulated peer steps on its own thread so it can answer the close
//! handshake while the handle waits for it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use ppp_iface::{
    LinkEvent, LinkSnapshot, PppInterface, Supervisor, SupervisorAction, TracingSink,
};
use ppp_link::{Clock, MonotonicClock};
use ppp_sim::{MemoryStream, SimEngineFactory, SimPeer};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::settings::Settings;

const PEER_STEP: Duration = Duration::from_millis(5);

/// What happened during a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Links the peer brought up
    pub sessions: u32,
    /// Whether the final close completed before the deadline
    pub clean_close: bool,
    /// The supervisor ran out of attempts
    pub gave_up: bool,
}

fn spawn_peer(mut peer: SimPeer, done: Arc<AtomicBool>) -> thread::JoinHandle<SimPeer> {
    thread::spawn(move || {
        let clock = MonotonicClock::new();
        while !done.load(Ordering::Acquire) {
            peer.step(clock.ticks_ms());
            clock.sleep(PEER_STEP);
        }
        peer
    })
}

fn log_event(event: &LinkEvent) {
    match event {
        LinkEvent::LinkUp { config, connected } => {
            info!("Link up: {} via {} (usable: {})", config.addr, config.gateway, connected)
        }
        LinkEvent::LinkDown { status } => warn!("Link down: {}", status),
        LinkEvent::CloseTimedOut { waited_ms } => {
            warn!("Close not acknowledged after {}ms", waited_ms)
        }
        other => info!("{:?}", other),
    }
}

/// Run until `stop` is raised or the supervisor gives up
pub fn run(
    settings: Settings,
    stop: Arc<AtomicBool>,
    snapshots: watch::Sender<LinkSnapshot>,
) -> Result<SessionSummary> {
    let (stream, io) = MemoryStream::pair();
    let peer_done = Arc::new(AtomicBool::new(false));
    let peer = spawn_peer(SimPeer::new(io, settings.peer.clone()), peer_done.clone());

    let mut iface = PppInterface::with_parts(
        stream,
        SimEngineFactory::new(),
        MonotonicClock::new(),
        settings.interface.clone(),
    );
    if settings.trace_frames {
        iface.set_trace_sink(TracingSink);
    }

    let mut supervisor = Supervisor::new(settings.connect.clone(), settings.reconnect.clone());
    let tick = Duration::from_millis(u64::from(settings.tick_ms.max(1)));
    let mut gave_up = false;

    let outcome = supervisor
        .start(&mut iface)
        .context("failed to start session")
        .and_then(|()| {
            while !stop.load(Ordering::Acquire) {
                let action = supervisor.tick(&mut iface).context("poll failed")?;
                for event in iface.drain_events() {
                    log_event(&event);
                }
                snapshots.send_replace(iface.snapshot());

                if action == SupervisorAction::GaveUp {
                    warn!("Reconnect attempts exhausted");
                    gave_up = true;
                    break;
                }
                iface.clock().sleep(tick);
            }
            Ok(())
        });

    let clean_close = supervisor.stop(&mut iface).unwrap_or_else(|e| {
        warn!("Deactivation failed: {}", e);
        false
    });
    for event in iface.drain_events() {
        log_event(&event);
    }
    snapshots.send_replace(iface.snapshot());

    peer_done.store(true, Ordering::Release);
    let peer = peer.join().map_err(|_| anyhow!("peer thread panicked"))?;
    outcome?;

    Ok(SessionSummary {
        sessions: peer.sessions(),
        clean_close: clean_close || iface.snapshot().clean_close,
        gave_up,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppp_iface::ConnectOptions;

    fn fast_settings() -> Settings {
        let mut settings = Settings {
            tick_ms: 2,
            ..Default::default()
        };
        settings.peer.answer_delay_ms = 0;
        settings.reconnect.initial_backoff_ms = 10;
        settings
    }

    #[test]
    fn test_session_connects_and_closes_cleanly() {
        let stop = Arc::new(AtomicBool::new(false));
        let (tx, rx) = watch::channel(LinkSnapshot::default());

        let stopper = {
            let stop = stop.clone();
            let rx = rx.clone();
            thread::spawn(move || {
                for _ in 0..500 {
                    if rx.borrow().connected {
                        break;
                    }
                    thread::sleep(Duration::from_millis(5));
                }
                stop.store(true, Ordering::Release);
            })
        };

        let summary = run(fast_settings(), stop, tx).unwrap();
        stopper.join().unwrap();

        assert_eq!(summary.sessions, 1);
        assert!(summary.clean_close);
        assert!(!summary.gave_up);
        assert!(!rx.borrow().active);
    }

    #[test]
    fn test_session_gives_up_on_auth_rejection() {
        let mut settings = fast_settings();
        settings.connect = ConnectOptions::pap("user", "wrong");
        settings.peer.reject_auth = true;
        settings.reconnect.max_attempts = Some(2);

        let (tx, _rx) = watch::channel(LinkSnapshot::default());
        let summary = run(settings, Arc::new(AtomicBool::new(false)), tx).unwrap();

        assert!(summary.gave_up);
        assert_eq!(summary.sessions, 0);
    }

    #[test]
    fn test_bad_credentials_fail_start() {
        let mut settings = fast_settings();
        settings.connect = ConnectOptions::new().with_authmode(7);

        let (tx, _rx) = watch::channel(LinkSnapshot::default());
        let err = run(settings, Arc::new(AtomicBool::new(false)), tx).unwrap_err();
        assert!(err.to_string().contains("failed to start session"));
    }
}

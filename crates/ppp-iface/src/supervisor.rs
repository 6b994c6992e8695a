//! Reconnect supervisor
//!
//! The interface handle never reconnects on its own: a link error leaves
//! `status() == -1` with no session in progress. [`Supervisor`] is the
//! higher-level loop that notices this and issues a fresh connect after an
//! exponential backoff, up to an optional attempt limit.
//!
//! It is driven by calling [`Supervisor::tick`] periodically; each tick polls
//! the interface once.

use ppp_link::{ticks_diff, Clock, EngineFactory, StreamAdapter};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::PppError;
use crate::interface::{ConnectOptions, PppInterface};
use crate::state::STATUS_ERROR;

/// Backoff settings for [`Supervisor`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    /// Delay before the first reconnect
    pub initial_backoff_ms: u32,
    /// Upper bound for the doubled delay
    pub max_backoff_ms: u32,
    /// Give up after this many consecutive reconnects; `None` retries forever
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 1000,
            max_backoff_ms: 30_000,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    fn next_backoff(&self, current: u32) -> u32 {
        current.saturating_mul(2).min(self.max_backoff_ms.max(1))
    }
}

/// Outcome of one [`Supervisor::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorAction {
    /// Not started, or the session was closed on request
    Idle,
    /// Negotiation in progress
    Connecting,
    /// Link up with an address
    Up,
    /// Link failed, reconnecting after the backoff
    Waiting {
        /// Time left before the next attempt
        remaining_ms: u32,
    },
    /// A reconnect was issued
    Reconnecting {
        /// Consecutive attempt number, starting at 1
        attempt: u32,
    },
    /// The attempt limit was reached
    GaveUp,
}

#[derive(Debug, Clone, Copy)]
struct PendingRetry {
    since: u32,
    delay_ms: u32,
}

/// Keeps an interface connected
#[derive(Debug)]
pub struct Supervisor {
    options: ConnectOptions,
    policy: ReconnectPolicy,
    running: bool,
    gave_up: bool,
    attempts: u32,
    backoff_ms: u32,
    pending: Option<PendingRetry>,
}

impl Supervisor {
    /// Create a stopped supervisor
    pub fn new(options: ConnectOptions, policy: ReconnectPolicy) -> Self {
        let backoff_ms = policy.initial_backoff_ms;
        Self {
            options,
            policy,
            running: false,
            gave_up: false,
            attempts: 0,
            backoff_ms,
            pending: None,
        }
    }

    /// Whether [`start`](Self::start) was called without a matching stop
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Consecutive reconnects since the link was last up
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay the next failure will wait
    pub fn backoff_ms(&self) -> u32 {
        self.backoff_ms
    }

    /// Get the policy
    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    fn reset_backoff(&mut self) {
        self.attempts = 0;
        self.backoff_ms = self.policy.initial_backoff_ms;
        self.pending = None;
    }

    /// Activate the interface and issue the first connect
    pub fn start<S, F, C>(&mut self, iface: &mut PppInterface<S, F, C>) -> Result<(), PppError>
    where
        S: StreamAdapter,
        F: EngineFactory,
        C: Clock,
    {
        iface.set_active(true)?;
        iface.connect(&self.options)?;
        self.reset_backoff();
        self.gave_up = false;
        self.running = true;
        Ok(())
    }

    /// Stop reconnecting and deactivate the interface
    pub fn stop<S, F, C>(&mut self, iface: &mut PppInterface<S, F, C>) -> Result<bool, PppError>
    where
        S: StreamAdapter,
        F: EngineFactory,
        C: Clock,
    {
        self.running = false;
        self.pending = None;
        iface.set_active(false)
    }

    /// Poll the interface once and reconnect if due
    pub fn tick<S, F, C>(
        &mut self,
        iface: &mut PppInterface<S, F, C>,
    ) -> Result<SupervisorAction, PppError>
    where
        S: StreamAdapter,
        F: EngineFactory,
        C: Clock,
    {
        if !self.running {
            return Ok(SupervisorAction::Idle);
        }
        iface.poll()?;

        if self.gave_up {
            return Ok(SupervisorAction::GaveUp);
        }
        if iface.is_connected() {
            if self.attempts > 0 {
                info!("Link restored after {} attempt(s)", self.attempts);
            }
            self.reset_backoff();
            return Ok(SupervisorAction::Up);
        }
        if iface.connect_active() {
            return Ok(SupervisorAction::Connecting);
        }
        if iface.status() != STATUS_ERROR {
            return Ok(SupervisorAction::Idle);
        }

        let now = iface.clock().ticks_ms();
        let Some(pending) = self.pending else {
            if let Some(max) = self.policy.max_attempts {
                if self.attempts >= max {
                    warn!("Giving up after {} reconnect attempt(s)", self.attempts);
                    self.gave_up = true;
                    return Ok(SupervisorAction::GaveUp);
                }
            }
            warn!("Link down, reconnecting in {}ms", self.backoff_ms);
            self.pending = Some(PendingRetry {
                since: now,
                delay_ms: self.backoff_ms,
            });
            return Ok(SupervisorAction::Waiting {
                remaining_ms: self.backoff_ms,
            });
        };

        let elapsed = ticks_diff(now, pending.since);
        if elapsed < pending.delay_ms {
            return Ok(SupervisorAction::Waiting {
                remaining_ms: pending.delay_ms - elapsed,
            });
        }

        self.pending = None;
        self.attempts += 1;
        self.backoff_ms = self.policy.next_backoff(self.backoff_ms);
        info!("Reconnect attempt {}", self.attempts);

        match iface.connect(&self.options) {
            Ok(()) => Ok(SupervisorAction::Reconnecting {
                attempt: self.attempts,
            }),
            Err(PppError::ConnectFailed(e)) => {
                warn!("Reconnect attempt {} failed: {}", self.attempts, e);
                Ok(SupervisorAction::Waiting { remaining_ms: 0 })
            }
            Err(e) => Err(e),
        }
    }
}

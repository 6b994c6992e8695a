//! Simulated remote end of a PPP link
//!
//! The peer reads the frames a [`crate::SimEngine`] writes and answers them
//! after a configurable delay, the way a dial-up server or a cellular modem
//! would. It can also be told to drop an established link after a while,
//! which is what drives reconnect handling in the supervisor.

use std::net::Ipv4Addr;

use ppp_link::ticks_diff;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::stream::MemoryPeer;

/// Behaviour of a simulated peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimPeerConfig {
    /// Address assigned to the local end
    pub local_addr: Ipv4Addr,
    /// The peer's own address
    pub peer_addr: Ipv4Addr,
    /// DNS servers offered during IPCP
    #[serde(default)]
    pub dns: Vec<Ipv4Addr>,
    /// Delay between a configure request and the link coming up
    #[serde(default = "default_answer_delay")]
    pub answer_delay_ms: u32,
    /// Drop an established link after this long
    #[serde(default)]
    pub drop_after_ms: Option<u32>,
    /// Reject every authenticated connect with an auth failure
    #[serde(default)]
    pub reject_auth: bool,
    /// Never acknowledge a terminate request
    #[serde(default)]
    pub ignore_terminate: bool,
}

fn default_answer_delay() -> u32 {
    200
}

impl Default for SimPeerConfig {
    fn default() -> Self {
        Self {
            local_addr: Ipv4Addr::new(10, 64, 64, 64),
            peer_addr: Ipv4Addr::new(10, 0, 0, 1),
            dns: vec![Ipv4Addr::new(8, 8, 8, 8), Ipv4Addr::new(8, 8, 4, 4)],
            answer_delay_ms: default_answer_delay(),
            drop_after_ms: None,
            reject_auth: false,
            ignore_terminate: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeerState {
    Idle,
    Answering { since: u32, reject: bool },
    Up { since: u32 },
}

/// Remote end driven by [`SimPeer::step`]
#[derive(Debug)]
pub struct SimPeer {
    io: MemoryPeer,
    config: SimPeerConfig,
    state: PeerState,
    sessions: u32,
}

impl SimPeer {
    /// Create a peer over the far end of a memory stream
    pub fn new(io: MemoryPeer, config: SimPeerConfig) -> Self {
        Self {
            io,
            config,
            state: PeerState::Idle,
            sessions: 0,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &SimPeerConfig {
        &self.config
    }

    /// Number of sessions brought up so far
    pub fn sessions(&self) -> u32 {
        self.sessions
    }

    /// Whether the peer considers the link up
    pub fn is_up(&self) -> bool {
        matches!(self.state, PeerState::Up { .. })
    }

    /// Process pending frames and timers at tick `now_ms`
    pub fn step(&mut self, now_ms: u32) {
        for frame in self.io.take_frames() {
            self.handle_frame(&frame, now_ms);
        }

        match self.state {
            PeerState::Answering { since, reject }
                if ticks_diff(now_ms, since) >= self.config.answer_delay_ms =>
            {
                if reject {
                    info!("sim peer rejecting authentication");
                    self.io.send_frame("DOWN 7");
                    self.state = PeerState::Idle;
                } else {
                    self.io.send_frame(&self.up_frame());
                    self.sessions += 1;
                    self.state = PeerState::Up { since: now_ms };
                    info!(
                        "sim peer link up (session {}): {} <-> {}",
                        self.sessions, self.config.local_addr, self.config.peer_addr
                    );
                }
            }
            PeerState::Up { since } => {
                if let Some(limit) = self.config.drop_after_ms {
                    if ticks_diff(now_ms, since) >= limit {
                        info!("sim peer dropping link after {}ms", limit);
                        self.io.send_frame("DOWN 6");
                        self.state = PeerState::Idle;
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_frame(&mut self, frame: &str, now_ms: u32) {
        let mut parts = frame.split_whitespace();
        match parts.next() {
            Some("CONFREQ") => {
                let auth = parts.next().unwrap_or("none");
                let reject = self.config.reject_auth && auth != "none";
                debug!("sim peer got configure request (auth {})", auth);
                self.state = PeerState::Answering {
                    since: now_ms,
                    reject,
                };
            }
            Some("TERMREQ") => {
                if self.config.ignore_terminate {
                    debug!("sim peer ignoring terminate request");
                } else {
                    self.io.send_frame("TERMACK");
                }
                self.state = PeerState::Idle;
            }
            Some("ECHOREP") | Some("TERMACK") => {}
            other => debug!("sim peer ignoring {:?}", other),
        }
    }

    fn up_frame(&self) -> String {
        let mut frame = format!("UP {} {}", self.config.local_addr, self.config.peer_addr);
        for server in self.config.dns.iter().take(2) {
            frame.push(' ');
            frame.push_str(&server.to_string());
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::encode_frame;
    use crate::stream::MemoryStream;
    use ppp_link::StreamAdapter;
    use std::time::Duration;

    fn read_all(stream: &mut MemoryStream) -> Vec<u8> {
        let mut buf = [0u8; 256];
        let n = stream.read(&mut buf, Duration::ZERO).unwrap();
        buf[..n].to_vec()
    }

    #[test]
    fn test_answers_after_delay() {
        let (mut stream, io) = MemoryStream::pair();
        let mut peer = SimPeer::new(
            io,
            SimPeerConfig {
                answer_delay_ms: 100,
                dns: vec![],
                ..Default::default()
            },
        );

        stream
            .write(&encode_frame("CONFREQ none"), Duration::ZERO)
            .unwrap();
        peer.step(0);
        assert!(read_all(&mut stream).is_empty());

        peer.step(100);
        assert_eq!(read_all(&mut stream), encode_frame("UP 10.64.64.64 10.0.0.1"));
        assert!(peer.is_up());
        assert_eq!(peer.sessions(), 1);
    }

    #[test]
    fn test_rejects_auth() {
        let (mut stream, io) = MemoryStream::pair();
        let mut peer = SimPeer::new(
            io,
            SimPeerConfig {
                answer_delay_ms: 0,
                reject_auth: true,
                ..Default::default()
            },
        );

        stream
            .write(&encode_frame("CONFREQ PAP"), Duration::ZERO)
            .unwrap();
        peer.step(5);
        assert_eq!(read_all(&mut stream), encode_frame("DOWN 7"));
        assert!(!peer.is_up());
    }

    #[test]
    fn test_drops_link() {
        let (mut stream, io) = MemoryStream::pair();
        let mut peer = SimPeer::new(
            io,
            SimPeerConfig {
                answer_delay_ms: 0,
                drop_after_ms: Some(1000),
                dns: vec![],
                ..Default::default()
            },
        );

        stream
            .write(&encode_frame("CONFREQ none"), Duration::ZERO)
            .unwrap();
        peer.step(0);
        read_all(&mut stream);

        peer.step(999);
        assert!(peer.is_up());
        peer.step(1000);
        assert!(!peer.is_up());
        assert_eq!(read_all(&mut stream), encode_frame("DOWN 6"));
    }

    #[test]
    fn test_config_defaults_from_json() {
        let config: SimPeerConfig =
            serde_json::from_str(r#"{"local_addr":"10.1.1.2","peer_addr":"10.1.1.1"}"#)
                .unwrap();
        assert_eq!(config.answer_delay_ms, 200);
        assert!(config.dns.is_empty());
        assert_eq!(config.drop_after_ms, None);
    }
}

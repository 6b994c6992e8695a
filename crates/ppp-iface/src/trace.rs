//! Frame tracing hook
//!
//! Every chunk read by poll and every chunk written by the output path can be
//! handed to a [`TraceSink`] together with its direction and a millisecond
//! timestamp. The default [`TracingSink`] logs an `xxd`-style dump at trace
//! level.

use std::sync::{Arc, Mutex};

use ppp_link::xxd;
use tracing::trace;

/// Direction of a traced chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Read from the stream, fed to the engine
    In,
    /// Produced by the engine, written to the stream
    Out,
}

impl Direction {
    /// Short label used in dumps
    pub fn label(&self) -> &'static str {
        match self {
            Direction::In => "ppp_in",
            Direction::Out => "ppp_out",
        }
    }
}

/// Receives traced frames
pub trait TraceSink {
    /// Record one chunk
    fn record(&mut self, direction: Direction, timestamp_ms: u32, data: &[u8]);
}

impl<F> TraceSink for F
where
    F: FnMut(Direction, u32, &[u8]),
{
    fn record(&mut self, direction: Direction, timestamp_ms: u32, data: &[u8]) {
        self(direction, timestamp_ms, data)
    }
}

/// Logs frames through `tracing` at trace level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn record(&mut self, direction: Direction, timestamp_ms: u32, data: &[u8]) {
        trace!(
            target: "ppp_iface::frames",
            "{}({},{})",
            direction.label(),
            timestamp_ms,
            xxd(data)
        );
    }
}

/// A traced chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    /// Direction
    pub direction: Direction,
    /// Clock ticks when recorded
    pub timestamp_ms: u32,
    /// Payload
    pub data: Vec<u8>,
}

/// Keeps traced frames in memory; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<TraceRecord>>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all recorded frames
    pub fn take(&self) -> Vec<TraceRecord> {
        std::mem::take(&mut *self.records.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl TraceSink for MemorySink {
    fn record(&mut self, direction: Direction, timestamp_ms: u32, data: &[u8]) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(TraceRecord {
                direction,
                timestamp_ms,
                data: data.to_vec(),
            });
    }
}

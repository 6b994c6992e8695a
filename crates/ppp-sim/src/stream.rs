//! In-memory duplex stream
//!
//! [`MemoryStream`] is the local end handed to an interface handle;
//! [`MemoryPeer`] is the far end a test or simulated peer drives.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use ppp_link::StreamAdapter;

use crate::frame::{encode_frame, FrameDecoder};

#[derive(Debug, Default)]
struct Pipe {
    to_local: VecDeque<u8>,
    to_peer: VecDeque<u8>,
    write_limit: Option<usize>,
    read_error: Option<io::ErrorKind>,
    read_calls: usize,
    write_calls: usize,
}

fn lock(pipe: &Mutex<Pipe>) -> MutexGuard<'_, Pipe> {
    pipe.lock().unwrap_or_else(|e| e.into_inner())
}

/// Local end of an in-memory link
///
/// Reads never block: the timeout is ignored and an empty pipe reads as 0.
#[derive(Debug, Clone)]
pub struct MemoryStream {
    pipe: Arc<Mutex<Pipe>>,
}

/// Far end of an in-memory link
#[derive(Debug, Clone)]
pub struct MemoryPeer {
    pipe: Arc<Mutex<Pipe>>,
    decoder: Arc<Mutex<FrameDecoder>>,
}

impl MemoryStream {
    /// Create a connected stream/peer pair
    pub fn pair() -> (MemoryStream, MemoryPeer) {
        let pipe = Arc::new(Mutex::new(Pipe::default()));
        (
            MemoryStream { pipe: pipe.clone() },
            MemoryPeer {
                pipe,
                decoder: Arc::new(Mutex::new(FrameDecoder::new())),
            },
        )
    }
}

impl StreamAdapter for MemoryStream {
    fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> io::Result<usize> {
        let mut pipe = lock(&self.pipe);
        pipe.read_calls += 1;
        if let Some(kind) = pipe.read_error.take() {
            return Err(io::Error::new(kind, "injected read error"));
        }
        let n = buf.len().min(pipe.to_local.len());
        for (slot, byte) in buf.iter_mut().zip(pipe.to_local.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8], _timeout: Duration) -> io::Result<usize> {
        let mut pipe = lock(&self.pipe);
        pipe.write_calls += 1;
        let n = pipe.write_limit.map_or(data.len(), |limit| limit.min(data.len()));
        pipe.to_peer.extend(&data[..n]);
        Ok(n)
    }
}

impl MemoryPeer {
    /// Queue raw bytes for the local end to read
    pub fn send(&self, data: &[u8]) {
        lock(&self.pipe).to_local.extend(data);
    }

    /// Queue a flag-delimited command
    pub fn send_frame(&self, payload: &str) {
        self.send(&encode_frame(payload));
    }

    /// Take every byte the local end has written so far
    pub fn take_sent(&self) -> Vec<u8> {
        lock(&self.pipe).to_peer.drain(..).collect()
    }

    /// Take and decode every complete frame the local end has written
    pub fn take_frames(&self) -> Vec<String> {
        let sent = self.take_sent();
        self.decoder
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(&sent)
    }

    /// Bytes queued for the local end but not yet read
    pub fn unread(&self) -> usize {
        lock(&self.pipe).to_local.len()
    }

    /// Cap every local write at `limit` bytes to simulate short writes
    pub fn set_write_limit(&self, limit: Option<usize>) {
        lock(&self.pipe).write_limit = limit;
    }

    /// Make the next local read fail with `kind`
    pub fn fail_next_read(&self, kind: io::ErrorKind) {
        lock(&self.pipe).read_error = Some(kind);
    }

    /// Number of local read calls so far
    pub fn read_calls(&self) -> usize {
        lock(&self.pipe).read_calls
    }

    /// Number of local write calls so far
    pub fn write_calls(&self) -> usize {
        lock(&self.pipe).write_calls
    }
}

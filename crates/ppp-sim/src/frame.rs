//! Flag-delimited frames for the simulated link
//!
//! Frames are ASCII commands wrapped in `0x7E` flags, e.g. `~CONFREQ~`.
//! There is no escaping; command text never contains the flag byte.

/// Frame delimiter
pub const FLAG: u8 = 0x7E;

/// Wrap a command in flags
pub fn encode_frame(payload: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 2);
    out.push(FLAG);
    out.extend_from_slice(payload.as_bytes());
    out.push(FLAG);
    out
}

/// Incremental frame decoder
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Push bytes, returning any completed frames
    ///
    /// Empty frames (back-to-back flags) are skipped, and frames that are not
    /// valid UTF-8 are dropped.
    pub fn push(&mut self, data: &[u8]) -> Vec<String> {
        let mut frames = Vec::new();
        for &b in data {
            if b == FLAG {
                if !self.buf.is_empty() {
                    let raw = std::mem::take(&mut self.buf);
                    if let Ok(text) = String::from_utf8(raw) {
                        frames.push(text);
                    }
                }
            } else {
                self.buf.push(b);
            }
        }
        frames
    }

    /// Number of bytes waiting for a closing flag
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_split_frames() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"~UP 10.0").is_empty());
        assert_eq!(decoder.pending(), 8);

        let frames = decoder.push(b".0.2 10.0.0.1~~TERMACK~");
        assert_eq!(frames, vec!["UP 10.0.0.2 10.0.0.1", "TERMACK"]);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_encode_frame() {
        assert_eq!(encode_frame("TERMREQ"), b"~TERMREQ~".to_vec());
    }

    #[test]
    fn test_invalid_utf8_dropped() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(&[FLAG, 0xff, 0xfe, FLAG, b'A', FLAG]);
        assert_eq!(frames, vec!["A"]);
    }
}

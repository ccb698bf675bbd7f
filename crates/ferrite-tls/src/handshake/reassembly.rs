//! Handshake message reassembly.
//!
//! TLS records fragment handshake messages arbitrarily: one record may
//! carry part of a message, exactly one, or several back to back. The
//! reassembler buffers handshake record payloads and hands out one
//! complete `type(1) || length(3) || body` frame at a time.

use crate::record::ContentType;

/// Handshake frame header size: msg_type(1) + length(3).
const FRAME_HEADER_LEN: usize = 4;

/// Buffers handshake record payloads and yields whole handshake frames.
///
/// The output is a pure function of the concatenated handshake bytes:
/// splitting the same stream into records differently yields the same
/// frame sequence. Non-handshake chunks (notably the TLS 1.3 middlebox
/// ChangeCipherSpec, content type 20) are discarded without touching the
/// buffer.
#[derive(Debug, Default)]
pub struct HandshakeReassembler {
    buf: Vec<u8>,
}

impl HandshakeReassembler {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Feed the plaintext payload of one record.
    ///
    /// Only handshake records extend the buffer; every other content type
    /// is ignored here (the connection driver decides whether e.g. an
    /// alert is fatal before feeding).
    pub fn feed(&mut self, content_type: ContentType, payload: &[u8]) {
        match content_type {
            ContentType::Handshake => self.buf.extend_from_slice(payload),
            ContentType::ChangeCipherSpec => {
                tracing::debug!(len = payload.len(), "ignoring ChangeCipherSpec record");
            }
            _ => {
                tracing::debug!(?content_type, "reassembler ignoring non-handshake record");
            }
        }
    }

    /// Take one complete handshake frame off the front of the buffer.
    ///
    /// Returns `None` when the buffer holds no frame or only a prefix
    /// of the next one; the caller then feeds another record and retries.
    /// Never returns a partial frame and never merges two frames. The
    /// big-endian 24-bit length field bounds bodies at 2^24-1; no further
    /// cap is imposed beyond what the record layer enforces.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        if self.buf.len() < FRAME_HEADER_LEN {
            return None;
        }
        let body_len = ((self.buf[1] as usize) << 16)
            | ((self.buf[2] as usize) << 8)
            | (self.buf[3] as usize);
        let total = FRAME_HEADER_LEN + body_len;
        if self.buf.len() < total {
            return None;
        }
        let frame = self.buf[..total].to_vec();
        self.buf.drain(..total);
        Some(frame)
    }

    /// Number of buffered bytes not yet consumed as frames.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

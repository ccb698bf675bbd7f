//! Transcript hash for TLS 1.3 handshake messages.
//!
//! Accumulates complete handshake message frames in wire order and
//! yields the running hash at any boundary.

use super::HashAlgorithm;
use sha2::{Digest, Sha256, Sha384};

/// Append-only transcript over handshake messages.
///
/// Keeps the raw message bytes and rehashes on demand: `current_hash()`
/// runs a fresh digest over the buffer, so intermediate hashes at
/// arbitrary message boundaries stay available while `update()` keeps
/// accepting new frames.
pub struct TranscriptHash {
    hash: HashAlgorithm,
    message_buffer: Vec<u8>,
}

impl TranscriptHash {
    /// Create a new transcript for the given hash algorithm.
    pub fn new(hash: HashAlgorithm) -> Self {
        Self {
            hash,
            message_buffer: Vec::new(),
        }
    }

    /// Feed one complete handshake message frame into the transcript.
    pub fn update(&mut self, data: &[u8]) {
        self.message_buffer.extend_from_slice(data);
    }

    /// Get the current transcript hash without consuming the state.
    pub fn current_hash(&self) -> Vec<u8> {
        match self.hash {
            HashAlgorithm::Sha256 => Sha256::digest(&self.message_buffer).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(&self.message_buffer).to_vec(),
        }
    }

    /// Hash of the buffer extended by `extra` without appending it.
    ///
    /// Used for the ServerFinished boundary tolerance, where the MAC may
    /// have been computed over the transcript including the Finished
    /// frame itself.
    pub fn hash_with(&self, extra: &[u8]) -> Vec<u8> {
        match self.hash {
            HashAlgorithm::Sha256 => {
                let mut h = Sha256::new();
                h.update(&self.message_buffer);
                h.update(extra);
                h.finalize().to_vec()
            }
            HashAlgorithm::Sha384 => {
                let mut h = Sha384::new();
                h.update(&self.message_buffer);
                h.update(extra);
                h.finalize().to_vec()
            }
        }
    }

    /// Total number of transcript bytes accumulated so far.
    pub fn len(&self) -> usize {
        self.message_buffer.len()
    }

    /// Whether no messages have been appended yet.
    pub fn is_empty(&self) -> bool {
        self.message_buffer.is_empty()
    }

    /// Hash output size in bytes.
    pub fn hash_len(&self) -> usize {
        self.hash.output_len()
    }
}

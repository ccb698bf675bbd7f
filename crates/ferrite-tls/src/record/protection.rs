//! TLS 1.3 record protection (RFC 8446 Section 5).
//!
//! A [`CipherState`] is one direction's cipher epoch: the AEAD keyed for
//! that direction, the static IV, and the record sequence number. The
//! record layer holds one per direction and replaces both on every epoch
//! change, which is what resets the sequence numbers.

use crate::crypt::aead::{create_aead, TlsAead};
use crate::crypt::traffic_keys::TrafficKeys;
use crate::record::ContentType;
use crate::CipherSuite;
use ferrite_types::TlsError;
use zeroize::Zeroize;

/// Largest plaintext fragment a record may carry (2^14, RFC 8446 §5.1).
pub const MAX_FRAGMENT: usize = 1 << 14;

/// Ceiling on protected-record expansion over the plaintext: inner type
/// byte, padding, and AEAD tag (RFC 8446 §5.2).
pub const MAX_EXPANSION: usize = 256;

/// legacy_record_version written on every record (TLS 1.2, frozen).
pub const LEGACY_RECORD_VERSION: u16 = 0x0303;

/// Static IV width; all TLS 1.3 suites use 12-byte nonces.
const IV_LEN: usize = 12;

/// One direction's cipher state for a single epoch.
///
/// The spec's (suite, key, IV, sequence) tuple: sequencing starts at 0,
/// advances once per protected record, and never survives into the next
/// epoch. The IV is wiped on drop.
pub struct CipherState {
    aead: Box<dyn TlsAead>,
    iv: [u8; IV_LEN],
    seq: u64,
}

impl Drop for CipherState {
    fn drop(&mut self) {
        self.iv.zeroize();
    }
}

impl CipherState {
    /// Key a fresh cipher state from traffic keys, sequence at 0.
    pub fn new(suite: CipherSuite, keys: &TrafficKeys) -> Result<Self, TlsError> {
        let iv: [u8; IV_LEN] = keys.iv.as_slice().try_into().map_err(|_| {
            TlsError::RecordError(format!("traffic iv must be {IV_LEN} bytes"))
        })?;
        Ok(Self {
            aead: create_aead(suite, &keys.key)?,
            iv,
            seq: 0,
        })
    }

    /// Records protected so far under this state.
    pub fn sequence(&self) -> u64 {
        self.seq
    }

    /// Per-record nonce: the sequence number, big-endian and left-padded
    /// to IV width, folded into the static IV (RFC 8446 §5.3).
    fn nonce(&self) -> [u8; IV_LEN] {
        let mut nonce = self.iv;
        for (n, s) in nonce[IV_LEN - 8..].iter_mut().zip(self.seq.to_be_bytes()) {
            *n ^= s;
        }
        nonce
    }

    /// additional_data: outer type || legacy version || fragment length.
    fn aad(fragment_len: usize) -> [u8; 5] {
        let len = (fragment_len as u16).to_be_bytes();
        [
            ContentType::ApplicationData as u8,
            (LEGACY_RECORD_VERSION >> 8) as u8,
            LEGACY_RECORD_VERSION as u8,
            len[0],
            len[1],
        ]
    }

    fn advance(&mut self) -> Result<(), TlsError> {
        self.seq = self
            .seq
            .checked_add(1)
            .ok_or_else(|| TlsError::RecordError("record sequence space exhausted".into()))?;
        Ok(())
    }

    /// Protect one fragment.
    ///
    /// Appends the real content type to the plaintext (RFC 8446 §5.4, no
    /// padding emitted), seals under the current nonce, and advances the
    /// sequence. The returned ciphertext is the fragment of an outer
    /// application_data record.
    pub fn seal(&mut self, content_type: ContentType, payload: &[u8]) -> Result<Vec<u8>, TlsError> {
        if payload.len() > MAX_FRAGMENT {
            return Err(TlsError::RecordError(
                "outgoing fragment larger than 2^14".into(),
            ));
        }
        let mut inner = Vec::with_capacity(payload.len() + 1);
        inner.extend_from_slice(payload);
        inner.push(content_type as u8);

        let aad = Self::aad(inner.len() + self.aead.tag_size());
        let sealed = self.aead.encrypt(&self.nonce(), &aad, &inner)?;
        inner.zeroize();
        self.advance()?;
        Ok(sealed)
    }

    /// Unprotect one application_data fragment.
    ///
    /// Opens under the current nonce, advances the sequence, strips the
    /// zero padding, and recovers the true content type (the last
    /// non-zero octet of the inner plaintext).
    pub fn open(&mut self, fragment: &[u8]) -> Result<(ContentType, Vec<u8>), TlsError> {
        if fragment.len() > MAX_FRAGMENT + MAX_EXPANSION {
            return Err(TlsError::RecordError(
                "incoming fragment over the size ceiling".into(),
            ));
        }
        if fragment.len() <= self.aead.tag_size() {
            return Err(TlsError::RecordError(
                "incoming fragment no longer than its tag".into(),
            ));
        }

        let aad = Self::aad(fragment.len());
        let mut inner = self.aead.decrypt(&self.nonce(), &aad, fragment)?;
        self.advance()?;

        let type_at = inner
            .iter()
            .rposition(|&b| b != 0)
            .ok_or_else(|| TlsError::RecordError("inner plaintext is all padding".into()))?;
        let content_type = ContentType::from_byte(inner[type_at]).ok_or_else(|| {
            TlsError::RecordError(format!("inner content type {} unknown", inner[type_at]))
        })?;
        if type_at > MAX_FRAGMENT {
            return Err(TlsError::RecordError(
                "inner content larger than 2^14".into(),
            ));
        }
        inner.truncate(type_at);
        Ok((content_type, inner))
    }
}

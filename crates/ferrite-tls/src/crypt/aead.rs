//! TLS AEAD cipher abstraction.
//!
//! Wraps AES-GCM and ChaCha20-Poly1305 behind a common trait.

use crate::CipherSuite;
use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm, KeyInit, Nonce};
use ferrite_types::TlsError;

/// AEAD nonce size (always 12 for TLS 1.3 suites).
const NONCE_LEN: usize = 12;

/// Trait for TLS record-layer AEAD operations.
pub trait TlsAead: Send + Sync {
    /// Encrypt plaintext with AEAD. Returns `ciphertext || tag`.
    fn encrypt(&self, nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, TlsError>;

    /// Decrypt `ciphertext || tag` with AEAD. Returns plaintext.
    fn decrypt(
        &self,
        nonce: &[u8],
        aad: &[u8],
        ciphertext_with_tag: &[u8],
    ) -> Result<Vec<u8>, TlsError>;

    /// Tag size in bytes.
    fn tag_size(&self) -> usize;
}

fn check_nonce(nonce: &[u8]) -> Result<(), TlsError> {
    if nonce.len() != NONCE_LEN {
        return Err(TlsError::CryptoError("aead: nonce must be 12 bytes".into()));
    }
    Ok(())
}

/// AES-128-GCM AEAD.
pub struct Aes128GcmAead {
    cipher: Aes128Gcm,
}

impl Aes128GcmAead {
    pub fn new(key: &[u8]) -> Result<Self, TlsError> {
        let cipher = Aes128Gcm::new_from_slice(key)
            .map_err(|_| TlsError::CryptoError("aes-128-gcm: invalid key length".into()))?;
        Ok(Self { cipher })
    }
}

impl TlsAead for Aes128GcmAead {
    fn encrypt(&self, nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, TlsError> {
        check_nonce(nonce)?;
        self.cipher
            .encrypt(Nonce::from_slice(nonce), Payload { msg: plaintext, aad })
            .map_err(|_| TlsError::CryptoError("aes-128-gcm: encryption failed".into()))
    }

    fn decrypt(
        &self,
        nonce: &[u8],
        aad: &[u8],
        ciphertext_with_tag: &[u8],
    ) -> Result<Vec<u8>, TlsError> {
        check_nonce(nonce)?;
        self.cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext_with_tag,
                    aad,
                },
            )
            .map_err(|_| TlsError::BadRecordMac)
    }

    fn tag_size(&self) -> usize {
        16
    }
}

/// AES-256-GCM AEAD.
pub struct Aes256GcmAead {
    cipher: Aes256Gcm,
}

impl Aes256GcmAead {
    pub fn new(key: &[u8]) -> Result<Self, TlsError> {
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|_| TlsError::CryptoError("aes-256-gcm: invalid key length".into()))?;
        Ok(Self { cipher })
    }
}

impl TlsAead for Aes256GcmAead {
    fn encrypt(&self, nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, TlsError> {
        check_nonce(nonce)?;
        self.cipher
            .encrypt(Nonce::from_slice(nonce), Payload { msg: plaintext, aad })
            .map_err(|_| TlsError::CryptoError("aes-256-gcm: encryption failed".into()))
    }

    fn decrypt(
        &self,
        nonce: &[u8],
        aad: &[u8],
        ciphertext_with_tag: &[u8],
    ) -> Result<Vec<u8>, TlsError> {
        check_nonce(nonce)?;
        self.cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext_with_tag,
                    aad,
                },
            )
            .map_err(|_| TlsError::BadRecordMac)
    }

    fn tag_size(&self) -> usize {
        16
    }
}

/// ChaCha20-Poly1305 AEAD.
pub struct ChaCha20Poly1305Aead {
    cipher: chacha20poly1305::ChaCha20Poly1305,
}

impl ChaCha20Poly1305Aead {
    pub fn new(key: &[u8]) -> Result<Self, TlsError> {
        let cipher = chacha20poly1305::ChaCha20Poly1305::new_from_slice(key)
            .map_err(|_| TlsError::CryptoError("chacha20-poly1305: invalid key length".into()))?;
        Ok(Self { cipher })
    }
}

impl TlsAead for ChaCha20Poly1305Aead {
    fn encrypt(&self, nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, TlsError> {
        check_nonce(nonce)?;
        self.cipher
            .encrypt(
                chacha20poly1305::Nonce::from_slice(nonce),
                Payload { msg: plaintext, aad },
            )
            .map_err(|_| TlsError::CryptoError("chacha20-poly1305: encryption failed".into()))
    }

    fn decrypt(
        &self,
        nonce: &[u8],
        aad: &[u8],
        ciphertext_with_tag: &[u8],
    ) -> Result<Vec<u8>, TlsError> {
        check_nonce(nonce)?;
        self.cipher
            .decrypt(
                chacha20poly1305::Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext_with_tag,
                    aad,
                },
            )
            .map_err(|_| TlsError::BadRecordMac)
    }

    fn tag_size(&self) -> usize {
        16
    }
}

/// Create a TlsAead instance for the given cipher suite and key.
pub fn create_aead(suite: CipherSuite, key: &[u8]) -> Result<Box<dyn TlsAead>, TlsError> {
    match suite {
        CipherSuite::TLS_AES_128_GCM_SHA256 => Ok(Box::new(Aes128GcmAead::new(key)?)),
        CipherSuite::TLS_AES_256_GCM_SHA384 => Ok(Box::new(Aes256GcmAead::new(key)?)),
        CipherSuite::TLS_CHACHA20_POLY1305_SHA256 => Ok(Box::new(ChaCha20Poly1305Aead::new(key)?)),
        _ => Err(TlsError::UnsupportedSuite),
    }
}

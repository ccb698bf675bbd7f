//! TLS cryptographic operations wrapper.
//!
//! Bridges the TLS protocol with the underlying RustCrypto primitives.

pub mod aead;
pub mod hkdf;
pub mod key_schedule;
pub mod keylog;
pub mod traffic_keys;
pub mod transcript;

use crate::CipherSuite;
use ferrite_types::TlsError;

/// Hash algorithm negotiated with the cipher suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
}

impl HashAlgorithm {
    /// Digest output size in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
        }
    }
}

/// Parameters associated with a TLS 1.3 cipher suite.
#[derive(Debug, Clone)]
pub struct CipherSuiteParams {
    /// The cipher suite identifier.
    pub suite: CipherSuite,
    /// Transcript/HKDF hash algorithm.
    pub hash: HashAlgorithm,
    /// AEAD key length in bytes.
    pub key_len: usize,
    /// AEAD IV/nonce length in bytes (always 12 for TLS 1.3).
    pub iv_len: usize,
    /// AEAD tag length in bytes (always 16).
    pub tag_len: usize,
}

impl CipherSuiteParams {
    /// Look up parameters for a TLS 1.3 cipher suite.
    pub fn from_suite(suite: CipherSuite) -> Result<Self, TlsError> {
        match suite {
            CipherSuite::TLS_AES_128_GCM_SHA256 => Ok(Self {
                suite,
                hash: HashAlgorithm::Sha256,
                key_len: 16,
                iv_len: 12,
                tag_len: 16,
            }),
            CipherSuite::TLS_AES_256_GCM_SHA384 => Ok(Self {
                suite,
                hash: HashAlgorithm::Sha384,
                key_len: 32,
                iv_len: 12,
                tag_len: 16,
            }),
            CipherSuite::TLS_CHACHA20_POLY1305_SHA256 => Ok(Self {
                suite,
                hash: HashAlgorithm::Sha256,
                key_len: 32,
                iv_len: 12,
                tag_len: 16,
            }),
            _ => Err(TlsError::UnsupportedSuite),
        }
    }

    /// Hash output size in bytes.
    pub fn hash_len(&self) -> usize {
        self.hash.output_len()
    }
}

/// TLS named group identifiers (for key exchange).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedGroup(pub u16);

impl NamedGroup {
    pub const SECP256R1: Self = Self(0x0017);
    pub const SECP384R1: Self = Self(0x0018);
    pub const X25519: Self = Self(0x001D);
}

/// TLS signature scheme identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureScheme(pub u16);

impl SignatureScheme {
    pub const RSA_PKCS1_SHA256: Self = Self(0x0401);
    pub const ECDSA_SECP256R1_SHA256: Self = Self(0x0403);
    pub const RSA_PSS_RSAE_SHA256: Self = Self(0x0804);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cipher_suite_params_key_and_iv_lengths() {
        let cases = [
            (CipherSuite::TLS_AES_128_GCM_SHA256, 16, HashAlgorithm::Sha256),
            (CipherSuite::TLS_AES_256_GCM_SHA384, 32, HashAlgorithm::Sha384),
            (
                CipherSuite::TLS_CHACHA20_POLY1305_SHA256,
                32,
                HashAlgorithm::Sha256,
            ),
        ];
        for (suite, key_len, hash) in cases {
            let params = CipherSuiteParams::from_suite(suite).unwrap();
            assert_eq!(params.key_len, key_len);
            assert_eq!(params.iv_len, 12);
            assert_eq!(params.tag_len, 16);
            assert_eq!(params.hash, hash);
        }
    }

    #[test]
    fn test_hash_lengths() {
        assert_eq!(HashAlgorithm::Sha256.output_len(), 32);
        assert_eq!(HashAlgorithm::Sha384.output_len(), 48);
    }

    #[test]
    fn test_unknown_suite_rejected() {
        assert!(matches!(
            CipherSuiteParams::from_suite(CipherSuite(0x1304)),
            Err(TlsError::UnsupportedSuite)
        ));
    }

    #[test]
    fn test_named_group_values() {
        assert_eq!(NamedGroup::X25519.0, 0x001D);
        assert_eq!(NamedGroup::SECP256R1.0, 0x0017);
        assert_eq!(NamedGroup::SECP384R1.0, 0x0018);
    }
}

#![forbid(unsafe_code)]
#![doc = "Synchronous TLS 1.3 client implementation."]

pub mod alert;
pub mod client;
pub mod config;
pub mod connection;
pub mod crypt;
pub mod extensions;
pub mod handshake;
pub mod record;

use ferrite_types::TlsError;

pub use client::{ClientOptions, TlsClient};
pub use config::TlsConfig;
pub use connection::client::TlsClientConnection;

/// TLS protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TlsVersion {
    Tls10,
    Tls11,
    Tls12,
    Tls13,
}

impl TlsVersion {
    /// Informational version number (10, 11, 12 or 13).
    pub fn number(&self) -> u8 {
        match self {
            TlsVersion::Tls10 => 10,
            TlsVersion::Tls11 => 11,
            TlsVersion::Tls12 => 12,
            TlsVersion::Tls13 => 13,
        }
    }
}

/// TLS cipher suite identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CipherSuite(pub u16);

impl CipherSuite {
    pub const TLS_AES_128_GCM_SHA256: Self = Self(0x1301);
    pub const TLS_AES_256_GCM_SHA384: Self = Self(0x1302);
    pub const TLS_CHACHA20_POLY1305_SHA256: Self = Self(0x1303);

    /// Look up a suite by its IANA name. Returns `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "TLS_AES_128_GCM_SHA256" => Some(Self::TLS_AES_128_GCM_SHA256),
            "TLS_AES_256_GCM_SHA384" => Some(Self::TLS_AES_256_GCM_SHA384),
            "TLS_CHACHA20_POLY1305_SHA256" => Some(Self::TLS_CHACHA20_POLY1305_SHA256),
            _ => None,
        }
    }

    /// IANA name of the suite, if recognised.
    pub fn name(&self) -> Option<&'static str> {
        match *self {
            Self::TLS_AES_128_GCM_SHA256 => Some("TLS_AES_128_GCM_SHA256"),
            Self::TLS_AES_256_GCM_SHA384 => Some("TLS_AES_256_GCM_SHA384"),
            Self::TLS_CHACHA20_POLY1305_SHA256 => Some("TLS_CHACHA20_POLY1305_SHA256"),
            _ => None,
        }
    }
}

/// Default cipher suite preference order.
pub const DEFAULT_CIPHER_SUITES: [CipherSuite; 3] = [
    CipherSuite::TLS_AES_128_GCM_SHA256,
    CipherSuite::TLS_AES_256_GCM_SHA384,
    CipherSuite::TLS_CHACHA20_POLY1305_SHA256,
];

/// A synchronous TLS connection.
pub trait TlsConnection {
    /// Perform the TLS handshake.
    fn handshake(&mut self) -> Result<(), TlsError>;
    /// Read decrypted data into `buf`.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TlsError>;
    /// Write data to be encrypted and sent.
    fn write(&mut self, buf: &[u8]) -> Result<usize, TlsError>;
    /// Shut down the TLS connection gracefully.
    fn shutdown(&mut self) -> Result<(), TlsError>;
    /// Get the negotiated TLS version.
    fn version(&self) -> Option<TlsVersion>;
    /// Get the negotiated cipher suite.
    fn cipher_suite(&self) -> Option<CipherSuite>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cipher_suite_wire_values() {
        assert_eq!(CipherSuite::TLS_AES_128_GCM_SHA256.0, 0x1301);
        assert_eq!(CipherSuite::TLS_AES_256_GCM_SHA384.0, 0x1302);
        assert_eq!(CipherSuite::TLS_CHACHA20_POLY1305_SHA256.0, 0x1303);
    }

    #[test]
    fn test_cipher_suite_name_roundtrip() {
        for suite in DEFAULT_CIPHER_SUITES {
            let name = suite.name().unwrap();
            assert_eq!(CipherSuite::from_name(name), Some(suite));
        }
        assert_eq!(CipherSuite::from_name("TLS_NULL_WITH_NULL_NULL"), None);
        assert_eq!(CipherSuite(0x00FF).name(), None);
    }

    #[test]
    fn test_version_numbers() {
        assert_eq!(TlsVersion::Tls10.number(), 10);
        assert_eq!(TlsVersion::Tls11.number(), 11);
        assert_eq!(TlsVersion::Tls12.number(), 12);
        assert_eq!(TlsVersion::Tls13.number(), 13);
    }
}

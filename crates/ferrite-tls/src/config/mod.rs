//! TLS configuration with builder pattern.

use std::fmt;
use std::sync::Arc;

use crate::crypt::{NamedGroup, SignatureScheme};
use crate::{CipherSuite, DEFAULT_CIPHER_SUITES};

/// Callback for NSS key log format output (SSLKEYLOGFILE-compatible).
///
/// Called with a pre-formatted line: `<label> <client_random_hex> <secret_hex>`.
/// The callback should append the line (plus a newline) to a log file or buffer.
pub type KeyLogCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// TLS configuration.
///
/// Immutable once built; the connection clones what it needs.
#[derive(Clone)]
pub struct TlsConfig {
    /// Enabled cipher suites (in preference order).
    pub cipher_suites: Vec<CipherSuite>,
    /// ALPN protocols (in preference order).
    pub alpn_protocols: Vec<Vec<u8>>,
    /// Server name for the SNI extension.
    pub server_name: Option<String>,
    /// Supported named groups for key exchange.
    pub supported_groups: Vec<NamedGroup>,
    /// Supported signature algorithms (in preference order).
    pub signature_algorithms: Vec<SignatureScheme>,
    /// Key log callback for NSS key log format (SSLKEYLOGFILE-compatible).
    pub key_log_callback: Option<KeyLogCallback>,
}

impl fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cipher_suites", &self.cipher_suites)
            .field("alpn_protocols", &self.alpn_protocols)
            .field("server_name", &self.server_name)
            .field("supported_groups", &self.supported_groups)
            .field("signature_algorithms", &self.signature_algorithms)
            .field(
                "key_log_callback",
                &self.key_log_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl TlsConfig {
    /// Create a builder for TLS configuration.
    pub fn builder() -> TlsConfigBuilder {
        TlsConfigBuilder::default()
    }
}

/// Builder for `TlsConfig`.
pub struct TlsConfigBuilder {
    cipher_suites: Vec<CipherSuite>,
    alpn_protocols: Vec<Vec<u8>>,
    server_name: Option<String>,
    supported_groups: Vec<NamedGroup>,
    signature_algorithms: Vec<SignatureScheme>,
    key_log_callback: Option<KeyLogCallback>,
}

impl Default for TlsConfigBuilder {
    fn default() -> Self {
        Self {
            cipher_suites: DEFAULT_CIPHER_SUITES.to_vec(),
            alpn_protocols: vec![b"http/1.1".to_vec()],
            server_name: None,
            supported_groups: vec![
                NamedGroup::X25519,
                NamedGroup::SECP256R1,
                NamedGroup::SECP384R1,
            ],
            signature_algorithms: vec![
                SignatureScheme::RSA_PSS_RSAE_SHA256,
                SignatureScheme::ECDSA_SECP256R1_SHA256,
                SignatureScheme::RSA_PKCS1_SHA256,
            ],
            key_log_callback: None,
        }
    }
}

impl TlsConfigBuilder {
    /// Set the cipher suite preference list.
    pub fn cipher_suites(mut self, suites: &[CipherSuite]) -> Self {
        self.cipher_suites = suites.to_vec();
        self
    }

    /// Set the ALPN protocols to offer.
    pub fn alpn(mut self, protocols: &[&[u8]]) -> Self {
        self.alpn_protocols = protocols.iter().map(|p| p.to_vec()).collect();
        self
    }

    /// Set the server name for SNI.
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// Set the key log callback.
    pub fn key_log_callback(mut self, cb: KeyLogCallback) -> Self {
        self.key_log_callback = Some(cb);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> TlsConfig {
        TlsConfig {
            cipher_suites: self.cipher_suites,
            alpn_protocols: self.alpn_protocols,
            server_name: self.server_name,
            supported_groups: self.supported_groups,
            signature_algorithms: self.signature_algorithms,
            key_log_callback: self.key_log_callback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TlsConfig::builder().build();
        assert_eq!(config.cipher_suites, DEFAULT_CIPHER_SUITES.to_vec());
        assert_eq!(config.alpn_protocols, vec![b"http/1.1".to_vec()]);
        assert!(config.server_name.is_none());
        assert_eq!(config.supported_groups[0], NamedGroup::X25519);
        assert_eq!(config.supported_groups.len(), 3);
        assert_eq!(config.signature_algorithms.len(), 3);
    }

    #[test]
    fn test_builder_overrides() {
        let config = TlsConfig::builder()
            .server_name("example.com")
            .cipher_suites(&[CipherSuite::TLS_CHACHA20_POLY1305_SHA256])
            .alpn(&[b"h2", b"http/1.1"])
            .build();
        assert_eq!(config.server_name.as_deref(), Some("example.com"));
        assert_eq!(
            config.cipher_suites,
            vec![CipherSuite::TLS_CHACHA20_POLY1305_SHA256]
        );
        assert_eq!(config.alpn_protocols.len(), 2);
    }

    #[test]
    fn test_debug_hides_callback() {
        let config = TlsConfig::builder()
            .key_log_callback(Arc::new(|_| {}))
            .build();
        let debug = format!("{config:?}");
        assert!(debug.contains("<callback>"));
    }
}

//! NSS Key Log Format support (SSLKEYLOGFILE).
//!
//! Provides Wireshark-compatible key logging for TLS debugging.
//! Format: `<label> <client_random_hex> <secret_hex>`

use crate::config::TlsConfig;

/// Convert bytes to lowercase hex string.
fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Log a key material line in NSS key log format.
///
/// Calls the `key_log_callback` on `config` (if set) with a line:
/// `<label> <client_random_hex> <secret_hex>`
pub fn log_key(config: &TlsConfig, label: &str, client_random: &[u8; 32], secret: &[u8]) {
    if let Some(cb) = &config.key_log_callback {
        let line = format!("{} {} {}", label, to_hex(client_random), to_hex(secret));
        cb(&line);
    }
}

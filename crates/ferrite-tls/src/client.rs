//! Blocking TLS 1.3 client over a TCP stream.
//!
//! Owns the transport lifecycle: DNS resolution, connect with timeout,
//! handshake, application data, close.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::TlsConfig;
use crate::connection::client::TlsClientConnection;
use crate::{CipherSuite, TlsConnection, TlsVersion, DEFAULT_CIPHER_SUITES};
use ferrite_types::TlsError;
use tracing::warn;

/// Client lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClientState {
    Initial,
    Connecting,
    Established,
    Closed,
    Error,
}

/// Options accepted at client construction.
///
/// The client copies what it needs; mutating an options value after
/// construction does not affect the client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Connect timeout in seconds.
    pub timeout: u64,
    /// Requested protocol version: "1.3" (default) or "1.2"
    /// (informational only; the core implements TLS 1.3).
    pub version: String,
    /// Cipher suite preference list by IANA name. Unknown names are
    /// dropped; the defaults are always appended.
    pub cipher_suites: Vec<String>,
    /// ALPN protocol identifiers to offer.
    pub alpn: Vec<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: 30,
            version: "1.3".to_string(),
            cipher_suites: Vec::new(),
            alpn: vec!["http/1.1".to_string()],
        }
    }
}

/// A blocking TLS 1.3 client.
pub struct TlsClient {
    hostname: String,
    port: u16,
    timeout: Duration,
    requested_version: TlsVersion,
    config: TlsConfig,
    conn: Option<TlsClientConnection<TcpStream>>,
    state: ClientState,
}

impl TlsClient {
    /// Create a client for `hostname:port`.
    ///
    /// Fails with `ConfigError` before any I/O when the options cannot
    /// be honoured.
    pub fn new(hostname: &str, port: u16, options: ClientOptions) -> Result<Self, TlsError> {
        if hostname.is_empty() {
            return Err(TlsError::ConfigError(
                "hostname must not be empty".into(),
            ));
        }

        let requested_version = match options.version.as_str() {
            "1.3" => TlsVersion::Tls13,
            "1.2" => TlsVersion::Tls12,
            other => {
                return Err(TlsError::ConfigError(format!(
                    "unsupported version option: {other:?}"
                )))
            }
        };

        let cipher_suites = resolve_cipher_suites(&options.cipher_suites)?;
        let alpn: Vec<Vec<u8>> = options
            .alpn
            .iter()
            .map(|p| p.as_bytes().to_vec())
            .collect();

        let mut builder = TlsConfig::builder()
            .server_name(hostname)
            .cipher_suites(&cipher_suites);
        if !alpn.is_empty() {
            let refs: Vec<&[u8]> = alpn.iter().map(|p| p.as_slice()).collect();
            builder = builder.alpn(&refs);
        }

        Ok(Self {
            hostname: hostname.to_string(),
            port,
            timeout: Duration::from_secs(options.timeout),
            requested_version,
            config: builder.build(),
            conn: None,
            state: ClientState::Initial,
        })
    }

    /// Resolve, connect, and run the handshake to completion.
    pub fn connect(&mut self) -> Result<(), TlsError> {
        if self.state != ClientState::Initial {
            return Err(TlsError::UsageError("connect on a used client"));
        }
        if self.requested_version != TlsVersion::Tls13 {
            return Err(TlsError::ConfigError(
                "only TLS 1.3 is implemented; version \"1.2\" is informational".into(),
            ));
        }

        self.state = ClientState::Connecting;
        match self.establish() {
            Ok(()) => {
                self.state = ClientState::Established;
                Ok(())
            }
            Err(e) => {
                self.state = ClientState::Error;
                self.conn = None;
                Err(e)
            }
        }
    }

    fn establish(&mut self) -> Result<(), TlsError> {
        let addr = (self.hostname.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| TlsError::ConnectFailed(format!("{}: {e}", self.hostname)))?
            .next()
            .ok_or_else(|| {
                TlsError::ConnectFailed(format!("{}: no addresses resolved", self.hostname))
            })?;

        let stream = TcpStream::connect_timeout(&addr, self.timeout)
            .map_err(|e| TlsError::ConnectFailed(format!("{addr}: {e}")))?;

        let mut conn = TlsClientConnection::new(stream, self.config.clone());
        conn.handshake()?;
        self.conn = Some(conn);
        Ok(())
    }

    /// Send application data. Requires an established connection.
    pub fn send_data(&mut self, data: &[u8]) -> Result<usize, TlsError> {
        if self.state != ClientState::Established {
            return Err(TlsError::UsageError("send_data before connect"));
        }
        let conn = self
            .conn
            .as_mut()
            .ok_or(TlsError::UsageError("send_data before connect"))?;
        match conn.write(data) {
            Ok(n) => Ok(n),
            Err(e) => {
                if e.is_fatal() {
                    self.state = ClientState::Error;
                }
                Err(e)
            }
        }
    }

    /// Receive one chunk of application data.
    ///
    /// Returns an empty buffer when the peer closed the stream.
    pub fn receive_data(&mut self) -> Result<Vec<u8>, TlsError> {
        if self.state != ClientState::Established {
            return Err(TlsError::UsageError("receive_data before connect"));
        }
        let conn = self
            .conn
            .as_mut()
            .ok_or(TlsError::UsageError("receive_data before connect"))?;

        let mut buf = vec![0u8; 16384];
        match conn.read(&mut buf) {
            Ok(0) => {
                self.state = ClientState::Closed;
                Ok(Vec::new())
            }
            Ok(n) => {
                buf.truncate(n);
                Ok(buf)
            }
            Err(e) => {
                if e.is_fatal() {
                    self.state = ClientState::Error;
                }
                Err(e)
            }
        }
    }

    /// Close the connection. Idempotent; a second `close` is a no-op.
    pub fn close(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            if let Err(e) = conn.shutdown() {
                warn!("shutdown error ignored on close: {e}");
            }
            // Dropping the connection closes the TCP stream exactly once.
        }
        if self.state != ClientState::Error {
            self.state = ClientState::Closed;
        }
    }

    /// Whether the handshake completed and the connection is usable.
    pub fn is_established(&self) -> bool {
        self.state == ClientState::Established
    }

    /// Lifecycle state as a string.
    pub fn state(&self) -> &'static str {
        match self.state {
            ClientState::Initial => "initial",
            ClientState::Connecting => "connecting",
            ClientState::Established => "established",
            ClientState::Closed => "closed",
            ClientState::Error => "error",
        }
    }

    /// Informational protocol version number (10, 11, 12 or 13).
    pub fn version(&self) -> u8 {
        self.conn
            .as_ref()
            .and_then(|c| c.version())
            .unwrap_or(self.requested_version)
            .number()
    }

    /// The negotiated cipher suite, once established.
    pub fn cipher_suite(&self) -> Option<CipherSuite> {
        self.conn.as_ref().and_then(|c| c.cipher_suite())
    }

    /// The negotiated ALPN protocol, once established.
    pub fn alpn_protocol(&self) -> Option<&[u8]> {
        self.conn.as_ref().and_then(|c| c.alpn_protocol())
    }

    /// The server's certificate chain (DER-encoded, leaf first), once
    /// established. Unvalidated; hand it to a verifier.
    pub fn peer_certificates(&self) -> &[Vec<u8>] {
        self.conn
            .as_ref()
            .map(|c| c.peer_certificates())
            .unwrap_or(&[])
    }
}

impl Drop for TlsClient {
    fn drop(&mut self) {
        self.close();
    }
}

/// Map configured suite names to identifiers: unknown names are dropped
/// with a warning, duplicates removed, defaults appended.
fn resolve_cipher_suites(names: &[String]) -> Result<Vec<CipherSuite>, TlsError> {
    let mut suites: Vec<CipherSuite> = Vec::new();
    for name in names {
        match CipherSuite::from_name(name) {
            Some(suite) => {
                if !suites.contains(&suite) {
                    suites.push(suite);
                }
            }
            None => warn!(suite = %name, "dropping unrecognised cipher suite"),
        }
    }
    if !names.is_empty() && suites.is_empty() {
        return Err(TlsError::ConfigError(
            "no recognised cipher in preference list".into(),
        ));
    }
    for suite in DEFAULT_CIPHER_SUITES {
        if !suites.contains(&suite) {
            suites.push(suite);
        }
    }
    Ok(suites)
}

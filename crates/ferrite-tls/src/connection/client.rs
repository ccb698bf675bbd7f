//! Synchronous TLS 1.3 client connection wrapping a `Read + Write` transport.

use std::io::{Read, Write};

use super::ConnectionState;
use crate::alert::{Alert, AlertDescription, AlertLevel};
use crate::config::TlsConfig;
use crate::handshake::client::ClientHandshake;
use crate::handshake::codec::read_frame;
use crate::handshake::reassembly::HandshakeReassembler;
use crate::handshake::{HandshakeState, HandshakeStateMachine, HandshakeType};
use crate::record::{ContentType, RecordLayer};
use crate::{CipherSuite, TlsConnection, TlsVersion};
use ferrite_types::TlsError;
use tracing::{debug, warn};

/// A synchronous TLS 1.3 client connection.
///
/// Drives the handshake over the wrapped stream, then carries
/// application data. The structural state machine is advanced here,
/// after each successful handshake step.
pub struct TlsClientConnection<S: Read + Write> {
    stream: S,
    config: TlsConfig,
    record_layer: RecordLayer,
    machine: HandshakeStateMachine,
    state: ConnectionState,
    negotiated_suite: Option<CipherSuite>,
    negotiated_version: Option<TlsVersion>,
    /// Buffer for raw bytes read from the stream.
    read_buf: Vec<u8>,
    /// Buffered decrypted application data.
    app_data_buf: Vec<u8>,
    /// Client handshake state (kept for post-handshake accessors).
    client_hs: Option<ClientHandshake>,
    /// Whether we have sent close_notify.
    sent_close_notify: bool,
    /// Whether we have received close_notify.
    received_close_notify: bool,
}

impl<S: Read + Write> TlsClientConnection<S> {
    /// Create a new TLS client connection wrapping the given stream.
    pub fn new(stream: S, config: TlsConfig) -> Self {
        Self {
            stream,
            config,
            record_layer: RecordLayer::new(),
            machine: HandshakeStateMachine::new(),
            state: ConnectionState::Handshaking,
            negotiated_suite: None,
            negotiated_version: None,
            read_buf: Vec::with_capacity(16 * 1024),
            app_data_buf: Vec::new(),
            client_hs: None,
            sent_close_notify: false,
            received_close_notify: false,
        }
    }

    /// The state machine's view of the handshake.
    pub fn handshake_state(&self) -> HandshakeState {
        self.machine.current_state()
    }

    /// Peer certificates (DER-encoded, leaf first).
    ///
    /// Chain validation is delegated to the caller; nothing here has
    /// authenticated the peer.
    pub fn peer_certificates(&self) -> &[Vec<u8>] {
        self.client_hs
            .as_ref()
            .map(|hs| hs.server_certs())
            .unwrap_or(&[])
    }

    /// Negotiated ALPN protocol (if any).
    pub fn alpn_protocol(&self) -> Option<&[u8]> {
        self.client_hs.as_ref().and_then(|hs| hs.negotiated_alpn())
    }

    /// Whether the peer sent close_notify.
    pub fn received_close_notify(&self) -> bool {
        self.received_close_notify
    }

    /// Drop all key material and handshake state.
    fn release_key_material(&mut self) {
        self.client_hs = None;
        self.record_layer = RecordLayer::new();
    }

    /// Read at least `min_bytes` from the stream into read_buf.
    fn fill_buf(&mut self, min_bytes: usize) -> Result<(), TlsError> {
        while self.read_buf.len() < min_bytes {
            let mut tmp = [0u8; 16384];
            let n = self.stream.read(&mut tmp)?;
            if n == 0 {
                return Err(TlsError::UnexpectedEof);
            }
            self.read_buf.extend_from_slice(&tmp[..n]);
        }
        Ok(())
    }

    /// Read a single record from the stream.
    /// Returns (content_type, plaintext).
    ///
    /// The record's bytes are always consumed, even when decryption
    /// fails, so the caller may skip undecryptable records and continue
    /// with the next one.
    fn read_record(&mut self) -> Result<(ContentType, Vec<u8>), TlsError> {
        // Need at least 5 bytes for the record header
        self.fill_buf(5)?;

        // Peek at the length to know how many bytes we need
        let length = u16::from_be_bytes([self.read_buf[3], self.read_buf[4]]) as usize;
        self.fill_buf(5 + length)?;

        match self.record_layer.open_record(&self.read_buf) {
            Ok((ct, plaintext, consumed)) => {
                self.read_buf.drain(..consumed);
                Ok((ct, plaintext))
            }
            Err(e) => {
                self.read_buf.drain(..5 + length);
                Err(e)
            }
        }
    }

    fn send_record(&mut self, content_type: ContentType, payload: &[u8]) -> Result<(), TlsError> {
        let record = self.record_layer.seal_record(content_type, payload)?;
        self.stream.write_all(&record)?;
        Ok(())
    }

    /// Run the TLS 1.3 client handshake.
    fn do_handshake(&mut self) -> Result<(), TlsError> {
        let mut hs = ClientHandshake::new(self.config.clone());
        let mut reassembler = HandshakeReassembler::new();

        // Step 1: Build and send ClientHello (plaintext epoch), then the
        // middlebox-compat ChangeCipherSpec (RFC 8446 §D.4).
        let ch_msg = hs.build_client_hello()?;
        self.send_record(ContentType::Handshake, &ch_msg)?;
        self.send_record(ContentType::ChangeCipherSpec, &[0x01])?;
        self.machine.try_transition(HandshakeState::WaitServerHello)?;

        // Step 2: Consume server handshake messages one at a time.
        loop {
            let frame = match reassembler.next_frame() {
                Some(frame) => frame,
                None => {
                    let (ct, plaintext) = self.read_record()?;
                    match ct {
                        ContentType::Handshake | ContentType::ChangeCipherSpec => {
                            // The reassembler keeps handshake bytes and
                            // silently drops the compat CCS.
                            reassembler.feed(ct, &plaintext);
                        }
                        ContentType::Alert => {
                            return Err(alert_error(&plaintext));
                        }
                        ContentType::ApplicationData => {
                            return Err(TlsError::HandshakeFailed(
                                "application data during handshake".into(),
                            ));
                        }
                    }
                    continue;
                }
            };

            match self.machine.current_state() {
                HandshakeState::WaitServerHello => {
                    let actions = hs.process_server_hello(&frame)?;
                    self.record_layer.install_handshake_keys(
                        actions.suite,
                        &actions.client_hs_keys,
                        &actions.server_hs_keys,
                    )?;
                    self.machine
                        .try_transition(HandshakeState::WaitEncryptedExtensions)?;
                }
                HandshakeState::WaitEncryptedExtensions => {
                    hs.process_encrypted_extensions(&frame)?;
                    self.machine
                        .try_transition(HandshakeState::WaitCertificate)?;
                }
                HandshakeState::WaitCertificate => {
                    hs.process_certificate(&frame)?;
                    self.machine
                        .try_transition(HandshakeState::WaitCertificateVerify)?;
                }
                HandshakeState::WaitCertificateVerify => {
                    hs.process_certificate_verify(&frame)?;
                    self.machine.try_transition(HandshakeState::WaitFinished)?;
                }
                HandshakeState::WaitFinished => {
                    let fin = hs.process_finished(&frame)?;

                    // Client Finished goes out under the handshake epoch,
                    // then both directions switch to application keys.
                    self.send_record(ContentType::Handshake, &fin.client_finished_msg)?;
                    self.record_layer.install_application_keys(
                        fin.suite,
                        &fin.client_app_keys,
                        &fin.server_app_keys,
                    )?;
                    self.machine.try_transition(HandshakeState::Connected)?;

                    self.negotiated_suite = Some(fin.suite);
                    self.negotiated_version = Some(TlsVersion::Tls13);
                    self.client_hs = Some(hs);
                    self.state = ConnectionState::Connected;
                    return Ok(());
                }
                state => {
                    return Err(TlsError::HandshakeFailed(format!(
                        "unexpected handshake state: {state:?}"
                    )));
                }
            }
        }
    }
}

/// Turn a received alert payload into the error that aborts the handshake.
fn alert_error(payload: &[u8]) -> TlsError {
    if payload.len() >= 2 {
        return match AlertDescription::from_u8(payload[1]) {
            Ok(desc) => TlsError::HandshakeFailed(format!("received alert: {desc:?}")),
            Err(code) => TlsError::HandshakeFailed(format!("received alert code {code}")),
        };
    }
    TlsError::HandshakeFailed("received malformed alert".into())
}

impl<S: Read + Write> TlsConnection for TlsClientConnection<S> {
    fn handshake(&mut self) -> Result<(), TlsError> {
        if self.state != ConnectionState::Handshaking {
            return Err(TlsError::UsageError(
                "handshake already completed or failed",
            ));
        }
        match self.do_handshake() {
            Ok(()) => Ok(()),
            Err(e) => {
                self.machine.fail();
                self.state = ConnectionState::Error;
                self.release_key_material();
                Err(e)
            }
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TlsError> {
        if self.state != ConnectionState::Connected {
            return Err(TlsError::UsageError("read before connection established"));
        }

        // Return buffered data first
        if !self.app_data_buf.is_empty() {
            let n = std::cmp::min(buf.len(), self.app_data_buf.len());
            buf[..n].copy_from_slice(&self.app_data_buf[..n]);
            self.app_data_buf.drain(..n);
            return Ok(n);
        }

        loop {
            let (ct, plaintext) = match self.read_record() {
                Ok(ok) => ok,
                // Leftover records sealed under a stale epoch (servers
                // flush NewSessionTicket and compat CCS around the key
                // change) fail AEAD; skip them rather than surfacing.
                Err(TlsError::BadRecordMac) => {
                    warn!("skipping record that failed AEAD verification");
                    continue;
                }
                Err(e) => {
                    self.machine.fail();
                    self.state = ConnectionState::Error;
                    self.release_key_material();
                    return Err(e);
                }
            };
            match ct {
                ContentType::ApplicationData => {
                    let n = std::cmp::min(buf.len(), plaintext.len());
                    buf[..n].copy_from_slice(&plaintext[..n]);
                    if plaintext.len() > n {
                        self.app_data_buf.extend_from_slice(&plaintext[n..]);
                    }
                    return Ok(n);
                }
                ContentType::Handshake => {
                    // Post-handshake messages (NewSessionTicket, KeyUpdate
                    // requests) are outside this client's scope.
                    match read_frame(&plaintext) {
                        Ok(frame) => match frame.msg_type {
                            HandshakeType::NewSessionTicket | HandshakeType::KeyUpdate => {
                                debug!(msg_type = ?frame.msg_type, "skipping post-handshake message");
                            }
                            other => {
                                warn!(?other, "skipping unexpected post-handshake message");
                            }
                        },
                        Err(e) => {
                            warn!("skipping undecodable post-handshake message: {e}");
                        }
                    }
                }
                ContentType::ChangeCipherSpec => {
                    debug!("skipping ChangeCipherSpec record");
                }
                ContentType::Alert => {
                    if plaintext.len() >= 2
                        && plaintext[1] == AlertDescription::CloseNotify as u8
                    {
                        self.received_close_notify = true;
                    } else {
                        debug!("closing on alert: {:02x?}", &plaintext);
                    }
                    self.state = ConnectionState::Closed;
                    self.release_key_material();
                    return Ok(0);
                }
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, TlsError> {
        if self.state != ConnectionState::Connected {
            return Err(TlsError::UsageError("write before connection established"));
        }

        if buf.is_empty() {
            return Ok(0);
        }

        let max_frag = self.record_layer.max_fragment_size;
        let mut offset = 0;
        while offset < buf.len() {
            let end = std::cmp::min(offset + max_frag, buf.len());
            match self.send_record(ContentType::ApplicationData, &buf[offset..end]) {
                Ok(()) => {}
                Err(e) => {
                    self.machine.fail();
                    self.state = ConnectionState::Error;
                    self.release_key_material();
                    return Err(e);
                }
            }
            offset = end;
        }
        Ok(buf.len())
    }

    fn shutdown(&mut self) -> Result<(), TlsError> {
        if self.state == ConnectionState::Closed {
            return Ok(());
        }

        if self.state == ConnectionState::Connected && !self.sent_close_notify {
            let alert = Alert {
                level: AlertLevel::Warning,
                description: AlertDescription::CloseNotify,
            };
            let payload = [alert.level as u8, alert.description as u8];
            // Best effort; the transport may already be gone.
            let _ = self.send_record(ContentType::Alert, &payload);
            self.sent_close_notify = true;
        }
        self.state = ConnectionState::Closed;
        self.release_key_material();
        Ok(())
    }

    fn version(&self) -> Option<TlsVersion> {
        self.negotiated_version
    }

    fn cipher_suite(&self) -> Option<CipherSuite> {
        self.negotiated_suite
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A stream that yields nothing; enough to exercise state guards.
    struct NullStream;

    impl Read for NullStream {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Ok(0)
        }
    }

    impl Write for NullStream {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn conn() -> TlsClientConnection<NullStream> {
        TlsClientConnection::new(NullStream, TlsConfig::builder().build())
    }

    #[test]
    fn test_read_write_before_handshake_are_usage_errors() {
        let mut c = conn();
        assert!(matches!(
            c.read(&mut [0u8; 16]),
            Err(TlsError::UsageError(_))
        ));
        assert!(matches!(c.write(b"data"), Err(TlsError::UsageError(_))));
    }

    #[test]
    fn test_handshake_eof_poisons_connection() {
        let mut c = conn();
        // The server never answers, so the handshake dies at the first read.
        let err = c.handshake().unwrap_err();
        assert!(matches!(err, TlsError::UnexpectedEof), "got: {err}");
        assert!(c.machine.is_error());

        // A second handshake attempt is refused.
        assert!(matches!(c.handshake(), Err(TlsError::UsageError(_))));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut c = conn();
        c.shutdown().unwrap();
        c.shutdown().unwrap();
        assert_eq!(c.state, ConnectionState::Closed);
    }

    #[test]
    fn test_no_negotiation_info_before_handshake() {
        let c = conn();
        assert!(c.version().is_none());
        assert!(c.cipher_suite().is_none());
        assert!(c.alpn_protocol().is_none());
        assert!(c.peer_certificates().is_empty());
        assert_eq!(c.handshake_state(), HandshakeState::Idle);
    }
}

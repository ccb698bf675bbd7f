//! TLS 1.3 client handshake logic.
//!
//! Implements the client side of the 1-RTT handshake:
//! ClientHello → ServerHello → {EncryptedExtensions} → {Certificate} →
//! {CertificateVerify} → {Finished} → client {Finished}

use crate::config::TlsConfig;
use crate::crypt::key_schedule::KeySchedule;
use crate::crypt::traffic_keys::TrafficKeys;
use crate::crypt::transcript::TranscriptHash;
use crate::crypt::{CipherSuiteParams, HashAlgorithm, NamedGroup};
use crate::extensions::ExtensionType;
use crate::CipherSuite;
use ferrite_types::TlsError;
use tracing::{debug, warn};
use zeroize::Zeroize;

use super::codec::{
    decode_certificate_chain, decode_certificate_verify, decode_encrypted_extensions,
    decode_finished, decode_server_hello, encode_client_hello, encode_finished, read_frame,
};
use super::extensions_codec::{
    build_alpn, build_key_share_ch, build_psk_key_exchange_modes, build_server_name,
    build_signature_algorithms, build_supported_groups, build_supported_versions_ch,
    parse_alpn_sh, parse_key_share_sh, parse_supported_versions_sh,
};
use super::key_exchange::KeyExchange;
use super::{HandshakeState, HandshakeType};

/// Keys produced by processing ServerHello: the handshake epoch for both
/// directions.
pub struct ServerHelloActions {
    pub client_hs_keys: TrafficKeys,
    pub server_hs_keys: TrafficKeys,
    pub suite: CipherSuite,
}

impl std::fmt::Debug for ServerHelloActions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerHelloActions")
            .field("client_hs_keys", &"<redacted>")
            .field("server_hs_keys", &"<redacted>")
            .field("suite", &self.suite)
            .finish()
    }
}

/// Actions to take after processing server Finished.
pub struct FinishedActions {
    /// Encoded client Finished handshake message (header + body).
    pub client_finished_msg: Vec<u8>,
    pub client_app_keys: TrafficKeys,
    pub server_app_keys: TrafficKeys,
    pub suite: CipherSuite,
}

/// Client handshake state.
///
/// Sequences message production and consumption; each `process_*` method
/// requires the state the previous step left behind. The connection
/// driver owns the structural state machine and advances it after each
/// successful step here.
pub struct ClientHandshake {
    config: TlsConfig,
    state: HandshakeState,
    key_exchange: Option<KeyExchange>,
    key_schedule: Option<KeySchedule>,
    transcript: TranscriptHash,
    params: Option<CipherSuiteParams>,
    negotiated_suite: Option<CipherSuite>,
    /// The raw ClientHello handshake message bytes (fed to the transcript
    /// once the hash algorithm is known).
    client_hello_msg: Vec<u8>,
    /// Client handshake traffic secret (for the finished key).
    client_hs_secret: Vec<u8>,
    /// Server handshake traffic secret (for the finished key).
    server_hs_secret: Vec<u8>,
    /// Client random (for key logging).
    client_random: [u8; 32],
    /// Server certificate chain (DER-encoded, leaf first).
    server_certs: Vec<Vec<u8>>,
    /// Negotiated ALPN protocol from EncryptedExtensions (if any).
    negotiated_alpn: Option<Vec<u8>>,
}

impl Drop for ClientHandshake {
    fn drop(&mut self) {
        self.client_hs_secret.zeroize();
        self.server_hs_secret.zeroize();
    }
}

impl ClientHandshake {
    /// Create a new client handshake.
    pub fn new(config: TlsConfig) -> Self {
        // The transcript is re-created with the negotiated hash when the
        // ServerHello arrives; until then nothing is fed to it.
        Self {
            config,
            state: HandshakeState::Idle,
            key_exchange: None,
            key_schedule: None,
            transcript: TranscriptHash::new(HashAlgorithm::Sha256),
            params: None,
            negotiated_suite: None,
            client_hello_msg: Vec::new(),
            client_hs_secret: Vec::new(),
            server_hs_secret: Vec::new(),
            client_random: [0u8; 32],
            server_certs: Vec::new(),
            negotiated_alpn: None,
        }
    }

    /// Current handshake state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Get the negotiated cipher suite (if any).
    pub fn negotiated_suite(&self) -> Option<CipherSuite> {
        self.negotiated_suite
    }

    /// Get the negotiated ALPN protocol (if any).
    pub fn negotiated_alpn(&self) -> Option<&[u8]> {
        self.negotiated_alpn.as_deref()
    }

    /// Get the server's certificate chain (DER-encoded, leaf first).
    ///
    /// Chain validation is delegated to an external verifier; a caller
    /// that needs an authenticated peer must check this chain before
    /// trusting application data.
    pub fn server_certs(&self) -> &[Vec<u8>] {
        &self.server_certs
    }

    /// Build the ClientHello handshake message.
    /// Returns the raw handshake message bytes (to be sent in a Handshake record).
    pub fn build_client_hello(&mut self) -> Result<Vec<u8>, TlsError> {
        if self.state != HandshakeState::Idle {
            return Err(TlsError::HandshakeFailed(
                "build_client_hello: wrong state".into(),
            ));
        }
        if self.config.cipher_suites.is_empty() {
            return Err(TlsError::ConfigError("no cipher suites configured".into()));
        }

        // Ephemeral key for the key_share extension. Only X25519 is
        // actually exchanged; the other groups are advertised for
        // negotiation completeness.
        let kx = KeyExchange::generate(NamedGroup::X25519)?;

        let mut random = [0u8; 32];
        getrandom::getrandom(&mut random)
            .map_err(|e| TlsError::HandshakeFailed(format!("random generation failed: {e}")))?;
        self.client_random = random;

        // A non-empty legacy_session_id improves middlebox compatibility.
        let mut session_id = [0u8; 32];
        getrandom::getrandom(&mut session_id)
            .map_err(|e| TlsError::HandshakeFailed(format!("random generation failed: {e}")))?;

        let mut extensions = vec![
            build_supported_versions_ch(),
            build_supported_groups(&self.config.supported_groups),
            build_signature_algorithms(&self.config.signature_algorithms),
            build_psk_key_exchange_modes(),
            build_key_share_ch(NamedGroup::X25519, kx.public_key_bytes()),
        ];
        if let Some(ref name) = self.config.server_name {
            extensions.push(build_server_name(name));
        }
        if !self.config.alpn_protocols.is_empty() {
            extensions.push(build_alpn(&self.config.alpn_protocols));
        }

        let msg =
            encode_client_hello(&random, &session_id, &self.config.cipher_suites, &extensions);

        self.client_hello_msg = msg.clone();
        self.key_exchange = Some(kx);
        self.state = HandshakeState::WaitServerHello;

        Ok(msg)
    }

    /// Process a ServerHello message.
    ///
    /// `msg_data` is the full handshake message including the 4-byte header.
    /// Fixes the hash algorithm, completes the ECDHE exchange, and derives
    /// the handshake-epoch traffic keys.
    pub fn process_server_hello(&mut self, msg_data: &[u8]) -> Result<ServerHelloActions, TlsError> {
        if self.state != HandshakeState::WaitServerHello {
            return Err(TlsError::HandshakeFailed(
                "process_server_hello: wrong state".into(),
            ));
        }

        let frame = read_frame(msg_data)?;
        if frame.msg_type != HandshakeType::ServerHello {
            return Err(TlsError::HandshakeFailed(format!(
                "expected ServerHello, got {:?}",
                frame.msg_type
            )));
        }
        let sh = decode_server_hello(frame.body)?;

        if sh.legacy_version != 0x0303 && sh.legacy_version != 0x0304 {
            return Err(TlsError::UnsupportedVersion);
        }

        // The supported_versions extension, when present, must select
        // TLS 1.3.
        if let Some(ext) = sh
            .extensions
            .iter()
            .find(|e| e.extension_type == ExtensionType::SUPPORTED_VERSIONS)
        {
            let version = parse_supported_versions_sh(&ext.data)?;
            if version != 0x0304 {
                return Err(TlsError::UnsupportedVersion);
            }
        }

        // The selected suite must come from our offer.
        let suite = sh.cipher_suite;
        if !self.config.cipher_suites.contains(&suite) {
            return Err(TlsError::HandshakeFailed(format!(
                "server selected cipher suite {:#06x} we did not offer",
                suite.0
            )));
        }
        let params = CipherSuiteParams::from_suite(suite)?;

        // The hash algorithm is fixed from here on; start the transcript
        // with ClientHello then ServerHello, in wire order.
        self.transcript = TranscriptHash::new(params.hash);
        self.transcript.update(&self.client_hello_msg);
        self.transcript.update(msg_data);

        // Extract and validate the server key_share.
        let ks_ext = sh
            .extensions
            .iter()
            .find(|e| e.extension_type == ExtensionType::KEY_SHARE)
            .ok_or_else(|| {
                TlsError::HandshakeFailed("missing key_share in ServerHello".into())
            })?;
        let (server_group, server_pub_key) = parse_key_share_sh(&ks_ext.data)?;
        if server_group != NamedGroup::X25519 {
            return Err(TlsError::HandshakeFailed(format!(
                "server key_share group {:#06x} is not X25519",
                server_group.0
            )));
        }
        if server_pub_key.len() != 32 {
            return Err(TlsError::KeyExchangeFailed(format!(
                "server X25519 key must be 32 bytes, got {}",
                server_pub_key.len()
            )));
        }

        let kx = self
            .key_exchange
            .as_ref()
            .ok_or_else(|| TlsError::HandshakeFailed("no key exchange state".into()))?;
        let shared_secret = kx.compute_shared_secret(&server_pub_key)?;

        // Key schedule: Early Secret → Handshake Secret → traffic secrets.
        let mut ks = KeySchedule::new(params.clone());
        ks.derive_early_secret()?;
        ks.derive_handshake_secret(&shared_secret)?;

        let transcript_hash = self.transcript.current_hash();
        let (client_hs_secret, server_hs_secret) =
            ks.derive_handshake_traffic_secrets(&transcript_hash)?;
        crate::crypt::keylog::log_key(
            &self.config,
            "CLIENT_HANDSHAKE_TRAFFIC_SECRET",
            &self.client_random,
            &client_hs_secret,
        );
        crate::crypt::keylog::log_key(
            &self.config,
            "SERVER_HANDSHAKE_TRAFFIC_SECRET",
            &self.client_random,
            &server_hs_secret,
        );

        let client_hs_keys = TrafficKeys::derive(&params, &client_hs_secret)?;
        let server_hs_keys = TrafficKeys::derive(&params, &server_hs_secret)?;

        self.client_hs_secret = client_hs_secret;
        self.server_hs_secret = server_hs_secret;
        self.key_schedule = Some(ks);
        self.params = Some(params);
        self.negotiated_suite = Some(suite);
        self.state = HandshakeState::WaitEncryptedExtensions;

        Ok(ServerHelloActions {
            client_hs_keys,
            server_hs_keys,
            suite,
        })
    }

    /// Process an EncryptedExtensions message.
    pub fn process_encrypted_extensions(&mut self, msg_data: &[u8]) -> Result<(), TlsError> {
        if self.state != HandshakeState::WaitEncryptedExtensions {
            return Err(TlsError::HandshakeFailed(
                "process_encrypted_extensions: wrong state".into(),
            ));
        }

        let frame = read_frame(msg_data)?;
        if frame.msg_type != HandshakeType::EncryptedExtensions {
            return Err(TlsError::HandshakeFailed(format!(
                "expected EncryptedExtensions, got {:?}",
                frame.msg_type
            )));
        }
        let extensions = decode_encrypted_extensions(frame.body)?;

        for ext in &extensions {
            if ext.extension_type == ExtensionType::APPLICATION_LAYER_PROTOCOL_NEGOTIATION {
                let proto = parse_alpn_sh(&ext.data)?;
                self.negotiated_alpn = Some(proto);
            }
        }

        self.transcript.update(msg_data);
        self.state = HandshakeState::WaitCertificate;
        Ok(())
    }

    /// Process a Certificate message.
    ///
    /// Decode failures are tolerated: the bytes still enter the transcript
    /// exactly as received, and chain validation is an external concern.
    pub fn process_certificate(&mut self, msg_data: &[u8]) -> Result<(), TlsError> {
        if self.state != HandshakeState::WaitCertificate {
            return Err(TlsError::HandshakeFailed(
                "process_certificate: wrong state".into(),
            ));
        }

        match read_frame(msg_data).and_then(|frame| decode_certificate_chain(frame.body)) {
            Ok(chain) => self.server_certs = chain,
            Err(e) => {
                warn!("tolerating undecodable Certificate message: {e}");
            }
        }

        self.transcript.update(msg_data);
        self.state = HandshakeState::WaitCertificateVerify;
        Ok(())
    }

    /// Process a CertificateVerify message.
    ///
    /// Signature verification belongs to the external certificate
    /// verifier; here the message is transcript input. Decode failures
    /// are tolerated like Certificate's.
    pub fn process_certificate_verify(&mut self, msg_data: &[u8]) -> Result<(), TlsError> {
        if self.state != HandshakeState::WaitCertificateVerify {
            return Err(TlsError::HandshakeFailed(
                "process_certificate_verify: wrong state".into(),
            ));
        }

        if let Err(e) = read_frame(msg_data).and_then(|frame| decode_certificate_verify(frame.body))
        {
            warn!("tolerating undecodable CertificateVerify message: {e}");
        }

        self.transcript.update(msg_data);
        self.state = HandshakeState::WaitFinished;
        Ok(())
    }

    /// Process the server Finished message.
    ///
    /// Verifies the MAC, emits the client Finished, and derives the
    /// application-epoch keys.
    pub fn process_finished(&mut self, msg_data: &[u8]) -> Result<FinishedActions, TlsError> {
        if self.state != HandshakeState::WaitFinished {
            return Err(TlsError::HandshakeFailed(
                "process_finished: wrong state".into(),
            ));
        }

        let params = self
            .params
            .as_ref()
            .ok_or_else(|| TlsError::HandshakeFailed("no cipher suite params".into()))?
            .clone();
        let ks = self
            .key_schedule
            .as_mut()
            .ok_or_else(|| TlsError::HandshakeFailed("no key schedule".into()))?;

        let frame = read_frame(msg_data)?;
        if frame.msg_type != HandshakeType::Finished {
            return Err(TlsError::HandshakeFailed(format!(
                "expected Finished, got {:?}",
                frame.msg_type
            )));
        }
        let verify_data = decode_finished(frame.body, params.hash_len())?;

        let server_finished_key = ks.derive_finished_key(&self.server_hs_secret)?;
        verify_server_finished(
            ks,
            &server_finished_key,
            &self.transcript,
            msg_data,
            &verify_data,
        )?;

        // Append the server Finished only after its MAC checks out.
        self.transcript.update(msg_data);

        // Build the client Finished over the transcript through the
        // server Finished.
        let transcript_hash_sf = self.transcript.current_hash();
        let client_finished_key = ks.derive_finished_key(&self.client_hs_secret)?;
        let client_verify_data =
            ks.compute_finished_verify_data(&client_finished_key, &transcript_hash_sf)?;
        let client_finished_msg = encode_finished(&client_verify_data);
        self.transcript.update(&client_finished_msg);

        // Application secrets are derived over the transcript through the
        // client Finished.
        ks.derive_master_secret()?;
        let transcript_hash_cf = self.transcript.current_hash();
        let (client_app_secret, server_app_secret) =
            ks.derive_app_traffic_secrets(&transcript_hash_cf)?;
        crate::crypt::keylog::log_key(
            &self.config,
            "CLIENT_TRAFFIC_SECRET_0",
            &self.client_random,
            &client_app_secret,
        );
        crate::crypt::keylog::log_key(
            &self.config,
            "SERVER_TRAFFIC_SECRET_0",
            &self.client_random,
            &server_app_secret,
        );

        let suite = self
            .negotiated_suite
            .ok_or_else(|| TlsError::HandshakeFailed("no negotiated suite".into()))?;
        let client_app_keys = TrafficKeys::derive(&params, &client_app_secret)?;
        let server_app_keys = TrafficKeys::derive(&params, &server_app_secret)?;

        self.state = HandshakeState::Connected;

        Ok(FinishedActions {
            client_finished_msg,
            client_app_keys,
            server_app_keys,
            suite,
        })
    }
}

/// Verify a server Finished MAC with the two-boundary tolerance.
///
/// The MAC is checked against the transcript up to (and excluding) the
/// Finished frame first; peers that frame the boundary to include the
/// frame are accepted on a second attempt before rejecting.
fn verify_server_finished(
    ks: &KeySchedule,
    finished_key: &[u8],
    transcript: &TranscriptHash,
    frame: &[u8],
    verify_data: &[u8],
) -> Result<(), TlsError> {
    let hash_excluding = transcript.current_hash();
    let expected = ks.compute_finished_verify_data(finished_key, &hash_excluding)?;
    if KeySchedule::finished_matches(verify_data, &expected) {
        return Ok(());
    }

    let hash_including = transcript.hash_with(frame);
    let expected_alt = ks.compute_finished_verify_data(finished_key, &hash_including)?;
    if KeySchedule::finished_matches(verify_data, &expected_alt) {
        debug!("server Finished verified against transcript including its own frame");
        return Ok(());
    }

    Err(TlsError::FinishedVerifyFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TlsConfig {
        TlsConfig::builder().server_name("example.com").build()
    }

    /// Parse extension types from a raw ClientHello handshake message.
    fn parse_extension_types(ch_msg: &[u8]) -> Vec<u16> {
        // Skip handshake header: type(1) + length(3) = 4
        let mut pos = 4;
        // version(2) + random(32)
        pos += 2 + 32;
        let sid_len = ch_msg[pos] as usize;
        pos += 1 + sid_len;
        let suites_len = u16::from_be_bytes([ch_msg[pos], ch_msg[pos + 1]]) as usize;
        pos += 2 + suites_len;
        let comp_len = ch_msg[pos] as usize;
        pos += 1 + comp_len;
        let ext_total = u16::from_be_bytes([ch_msg[pos], ch_msg[pos + 1]]) as usize;
        pos += 2;
        let ext_end = pos + ext_total;
        let mut types = Vec::new();
        while pos + 4 <= ext_end && pos + 4 <= ch_msg.len() {
            let etype = u16::from_be_bytes([ch_msg[pos], ch_msg[pos + 1]]);
            let elen = u16::from_be_bytes([ch_msg[pos + 2], ch_msg[pos + 3]]) as usize;
            types.push(etype);
            pos += 4 + elen;
        }
        types
    }

    #[test]
    fn test_client_handshake_init() {
        let hs = ClientHandshake::new(config());
        assert_eq!(hs.state(), HandshakeState::Idle);
        assert!(hs.negotiated_suite().is_none());
        assert!(hs.negotiated_alpn().is_none());
        assert!(hs.server_certs().is_empty());
    }

    #[test]
    fn test_client_hello_generation() {
        let mut hs = ClientHandshake::new(config());

        let ch_msg = hs.build_client_hello().unwrap();
        assert_eq!(hs.state(), HandshakeState::WaitServerHello);

        assert!(ch_msg.len() > 4);
        assert_eq!(ch_msg[0], 1); // ClientHello type

        // legacy_session_id is 32 bytes
        assert_eq!(ch_msg[4 + 2 + 32], 32);

        // Cannot build ClientHello again
        assert!(hs.build_client_hello().is_err());
    }

    #[test]
    fn test_client_hello_extension_set() {
        let mut hs = ClientHandshake::new(config());
        let ch_msg = hs.build_client_hello().unwrap();
        let ext_types = parse_extension_types(&ch_msg);

        for expected in [
            0u16, // server_name
            10,   // supported_groups
            13,   // signature_algorithms
            16,   // ALPN
            43,   // supported_versions
            45,   // psk_key_exchange_modes
            51,   // key_share
        ] {
            assert!(
                ext_types.contains(&expected),
                "ClientHello missing extension {expected}, got {ext_types:?}"
            );
        }
    }

    #[test]
    fn test_client_hello_no_sni_without_server_name() {
        let cfg = TlsConfig::builder().build();
        let mut hs = ClientHandshake::new(cfg);
        let ch_msg = hs.build_client_hello().unwrap();
        let ext_types = parse_extension_types(&ch_msg);
        assert!(!ext_types.contains(&0u16));
    }

    #[test]
    fn test_client_hello_contains_hostname_bytes() {
        let mut hs = ClientHandshake::new(
            TlsConfig::builder().server_name("test.example.com").build(),
        );
        let ch_msg = hs.build_client_hello().unwrap();
        assert!(ch_msg.windows(16).any(|w| w == b"test.example.com"));
    }

    #[test]
    fn test_client_hello_randoms_differ() {
        let mut a = ClientHandshake::new(config());
        let mut b = ClientHandshake::new(config());
        let ch_a = a.build_client_hello().unwrap();
        let ch_b = b.build_client_hello().unwrap();
        // random field at body offset 2..34
        assert_ne!(ch_a[6..38], ch_b[6..38]);
    }

    #[test]
    fn test_empty_cipher_suites_rejected() {
        let cfg = TlsConfig::builder().cipher_suites(&[]).build();
        let mut hs = ClientHandshake::new(cfg);
        assert!(matches!(
            hs.build_client_hello(),
            Err(TlsError::ConfigError(_))
        ));
    }

    #[test]
    fn test_state_enforcement() {
        let mut hs = ClientHandshake::new(config());

        // Can't process ServerHello before ClientHello
        assert!(hs.process_server_hello(&[2, 0, 0, 4, 0, 0, 0, 0]).is_err());

        // Can't process EncryptedExtensions from Idle
        assert!(hs
            .process_encrypted_extensions(&[8, 0, 0, 2, 0, 0])
            .is_err());

        // Can't process Certificate from Idle
        assert!(hs.process_certificate(&[11, 0, 0, 4, 0, 0, 0, 0]).is_err());

        // Can't process CertificateVerify from Idle
        assert!(hs
            .process_certificate_verify(&[15, 0, 0, 4, 0, 0, 0, 0])
            .is_err());

        // Can't process Finished from Idle
        assert!(hs.process_finished(&[20, 0, 0, 2, 0, 0]).is_err());
    }

    #[test]
    fn test_server_hello_unknown_suite_rejected() {
        let mut hs = ClientHandshake::new(config());
        hs.build_client_hello().unwrap();

        // ServerHello selecting a suite we never offered (0x1304)
        let mut body = Vec::new();
        body.extend_from_slice(&0x0303u16.to_be_bytes());
        body.extend_from_slice(&[0xBB; 32]);
        body.push(0);
        body.extend_from_slice(&0x1304u16.to_be_bytes());
        body.push(0);
        let mut msg = vec![2, 0, 0, body.len() as u8];
        msg.extend_from_slice(&body);

        assert!(hs.process_server_hello(&msg).is_err());
    }

    #[test]
    fn test_server_hello_bad_legacy_version_rejected() {
        let mut hs = ClientHandshake::new(config());
        hs.build_client_hello().unwrap();

        let mut body = Vec::new();
        body.extend_from_slice(&0x0301u16.to_be_bytes()); // TLS 1.0
        body.extend_from_slice(&[0xBB; 32]);
        body.push(0);
        body.extend_from_slice(&0x1301u16.to_be_bytes());
        body.push(0);
        let mut msg = vec![2, 0, 0, body.len() as u8];
        msg.extend_from_slice(&body);

        assert!(matches!(
            hs.process_server_hello(&msg),
            Err(TlsError::UnsupportedVersion)
        ));
    }

    #[test]
    fn test_server_hello_missing_key_share_rejected() {
        let mut hs = ClientHandshake::new(config());
        hs.build_client_hello().unwrap();

        // Valid suite + supported_versions but no key_share
        let mut body = Vec::new();
        body.extend_from_slice(&0x0303u16.to_be_bytes());
        body.extend_from_slice(&[0xBB; 32]);
        body.push(0);
        body.extend_from_slice(&0x1301u16.to_be_bytes());
        body.push(0);
        let ext = vec![0x00, 0x2b, 0x00, 0x02, 0x03, 0x04];
        body.extend_from_slice(&(ext.len() as u16).to_be_bytes());
        body.extend_from_slice(&ext);
        let mut msg = vec![2, 0, 0, body.len() as u8];
        msg.extend_from_slice(&body);

        let err = hs.process_server_hello(&msg).unwrap_err();
        assert!(err.to_string().contains("key_share"), "got: {err}");
    }

    #[test]
    fn test_finished_boundary_tolerance() {
        let params = CipherSuiteParams::from_suite(CipherSuite::TLS_AES_128_GCM_SHA256).unwrap();
        let ks = KeySchedule::new(params);
        let finished_key = vec![0x42; 32];

        let mut transcript = TranscriptHash::new(HashAlgorithm::Sha256);
        transcript.update(b"client hello bytes");
        transcript.update(b"server flight bytes");

        // A fixed Finished frame; the two boundary candidates differ.
        let frame = encode_finished(&[0xAA; 32]);
        let mac_excluding = ks
            .compute_finished_verify_data(&finished_key, &transcript.current_hash())
            .unwrap();
        let mac_including = ks
            .compute_finished_verify_data(&finished_key, &transcript.hash_with(&frame))
            .unwrap();
        assert_ne!(mac_excluding, mac_including);

        // Either framing verifies...
        verify_server_finished(&ks, &finished_key, &transcript, &frame, &mac_excluding)
            .unwrap();
        verify_server_finished(&ks, &finished_key, &transcript, &frame, &mac_including)
            .unwrap();

        // ...anything else is rejected.
        let err = verify_server_finished(&ks, &finished_key, &transcript, &frame, &[0x00; 32])
            .unwrap_err();
        assert!(matches!(err, TlsError::FinishedVerifyFailed));
    }

    #[test]
    fn test_server_hello_wrong_group_rejected() {
        let mut hs = ClientHandshake::new(config());
        hs.build_client_hello().unwrap();

        // key_share carrying secp256r1 instead of X25519
        let mut body = Vec::new();
        body.extend_from_slice(&0x0303u16.to_be_bytes());
        body.extend_from_slice(&[0xBB; 32]);
        body.push(0);
        body.extend_from_slice(&0x1301u16.to_be_bytes());
        body.push(0);
        let mut ks_data = vec![0x00, 0x17, 0x00, 0x20];
        ks_data.extend_from_slice(&[0x01; 32]);
        let mut ext = vec![0x00, 0x33];
        ext.extend_from_slice(&(ks_data.len() as u16).to_be_bytes());
        ext.extend_from_slice(&ks_data);
        body.extend_from_slice(&(ext.len() as u16).to_be_bytes());
        body.extend_from_slice(&ext);
        let mut msg = vec![2, 0, 0, body.len() as u8];
        msg.extend_from_slice(&body);

        let err = hs.process_server_hello(&msg).unwrap_err();
        assert!(err.to_string().contains("X25519"), "got: {err}");
    }
}

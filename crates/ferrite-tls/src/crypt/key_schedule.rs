//! TLS 1.3 Key Schedule (RFC 8446 Section 7.1).
//!
//! Implements the secret derivation chain:
//! Early Secret → Handshake Secret → Master Secret → Traffic Secrets.

use super::hkdf::{derive_secret, hkdf_expand_label, hkdf_extract, hmac_hash};
use super::CipherSuiteParams;
use ferrite_types::TlsError;
use sha2::{Digest, Sha256, Sha384};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

/// Current stage of the TLS 1.3 key derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScheduleStage {
    Initial,
    EarlySecret,
    HandshakeSecret,
    MasterSecret,
}

/// TLS 1.3 Key Schedule state.
///
/// Tracks the current secret and stage; invoking a derivation step before
/// its prerequisite stage fails with `KeyScheduleNotReady`. All secret
/// material is zeroized on drop.
pub struct KeySchedule {
    params: CipherSuiteParams,
    stage: KeyScheduleStage,
    current_secret: Vec<u8>,
}

impl Drop for KeySchedule {
    fn drop(&mut self) {
        self.current_secret.zeroize();
    }
}

impl KeySchedule {
    /// Create a new KeySchedule for the given cipher suite.
    pub fn new(params: CipherSuiteParams) -> Self {
        Self {
            params,
            stage: KeyScheduleStage::Initial,
            current_secret: Vec::new(),
        }
    }

    /// Return the current stage.
    pub fn stage(&self) -> KeyScheduleStage {
        self.stage
    }

    /// Hash length for this cipher suite.
    pub fn hash_len(&self) -> usize {
        self.params.hash_len()
    }

    /// Compute Hash("") for the "derived" label context.
    fn empty_hash(&self) -> Vec<u8> {
        match self.params.hash {
            super::HashAlgorithm::Sha256 => Sha256::digest(b"").to_vec(),
            super::HashAlgorithm::Sha384 => Sha384::digest(b"").to_vec(),
        }
    }

    /// Derive the Early Secret. PSK flows are out of scope, so the input
    /// keying material is always `hash_len` zero bytes.
    ///
    /// Transitions: Initial → EarlySecret.
    pub fn derive_early_secret(&mut self) -> Result<(), TlsError> {
        if self.stage != KeyScheduleStage::Initial {
            return Err(TlsError::KeyScheduleNotReady("derive_early_secret"));
        }
        let zero_ikm = vec![0u8; self.params.hash_len()];
        self.current_secret = hkdf_extract(self.params.hash, &[], &zero_ikm);
        self.stage = KeyScheduleStage::EarlySecret;
        Ok(())
    }

    /// Derive the Handshake Secret from the ECDHE shared secret.
    ///
    /// Transitions: EarlySecret → HandshakeSecret.
    ///
    /// Internally: `Derive-Secret(ES, "derived", "") → salt → HKDF-Extract(salt, DHE)`
    pub fn derive_handshake_secret(&mut self, dhe_shared_secret: &[u8]) -> Result<(), TlsError> {
        if self.stage != KeyScheduleStage::EarlySecret {
            return Err(TlsError::KeyScheduleNotReady("derive_handshake_secret"));
        }
        if dhe_shared_secret.len() != 32 {
            return Err(TlsError::KeyExchangeFailed(format!(
                "shared secret must be 32 bytes, got {}",
                dhe_shared_secret.len()
            )));
        }
        let empty_hash = self.empty_hash();
        let mut salt = derive_secret(
            self.params.hash,
            &self.current_secret,
            b"derived",
            &empty_hash,
        )?;
        self.current_secret.zeroize();
        self.current_secret = hkdf_extract(self.params.hash, &salt, dhe_shared_secret);
        salt.zeroize();
        self.stage = KeyScheduleStage::HandshakeSecret;
        Ok(())
    }

    /// Derive client and server handshake traffic secrets.
    ///
    /// `transcript_hash` = Hash(ClientHello..ServerHello).
    ///
    /// Returns `(client_hs_traffic_secret, server_hs_traffic_secret)`.
    pub fn derive_handshake_traffic_secrets(
        &self,
        transcript_hash: &[u8],
    ) -> Result<(Vec<u8>, Vec<u8>), TlsError> {
        if self.stage != KeyScheduleStage::HandshakeSecret {
            return Err(TlsError::KeyScheduleNotReady(
                "derive_handshake_traffic_secrets",
            ));
        }
        let client = derive_secret(
            self.params.hash,
            &self.current_secret,
            b"c hs traffic",
            transcript_hash,
        )?;
        let server = derive_secret(
            self.params.hash,
            &self.current_secret,
            b"s hs traffic",
            transcript_hash,
        )?;
        Ok((client, server))
    }

    /// Derive the Master Secret.
    ///
    /// Transitions: HandshakeSecret → MasterSecret.
    ///
    /// Internally: `Derive-Secret(HS, "derived", "") → salt → HKDF-Extract(salt, 0)`
    pub fn derive_master_secret(&mut self) -> Result<(), TlsError> {
        if self.stage != KeyScheduleStage::HandshakeSecret {
            return Err(TlsError::KeyScheduleNotReady("derive_master_secret"));
        }
        let empty_hash = self.empty_hash();
        let mut salt = derive_secret(
            self.params.hash,
            &self.current_secret,
            b"derived",
            &empty_hash,
        )?;
        let zero_ikm = vec![0u8; self.params.hash_len()];
        self.current_secret.zeroize();
        self.current_secret = hkdf_extract(self.params.hash, &salt, &zero_ikm);
        salt.zeroize();
        self.stage = KeyScheduleStage::MasterSecret;
        Ok(())
    }

    /// Derive client and server application traffic secrets.
    ///
    /// `transcript_hash` = Hash(ClientHello..client Finished).
    ///
    /// Returns `(client_app_traffic_secret, server_app_traffic_secret)`.
    pub fn derive_app_traffic_secrets(
        &self,
        transcript_hash: &[u8],
    ) -> Result<(Vec<u8>, Vec<u8>), TlsError> {
        if self.stage != KeyScheduleStage::MasterSecret {
            return Err(TlsError::KeyScheduleNotReady("derive_app_traffic_secrets"));
        }
        let client = derive_secret(
            self.params.hash,
            &self.current_secret,
            b"c ap traffic",
            transcript_hash,
        )?;
        let server = derive_secret(
            self.params.hash,
            &self.current_secret,
            b"s ap traffic",
            transcript_hash,
        )?;
        Ok((client, server))
    }

    /// Derive a finished key from a traffic secret.
    ///
    /// `finished_key = HKDF-Expand-Label(base_key, "finished", "", Hash.length)`
    pub fn derive_finished_key(&self, base_key: &[u8]) -> Result<Vec<u8>, TlsError> {
        hkdf_expand_label(
            self.params.hash,
            base_key,
            b"finished",
            b"",
            self.params.hash_len(),
        )
    }

    /// Compute the Finished verify_data.
    ///
    /// `verify_data = HMAC(finished_key, transcript_hash)`
    pub fn compute_finished_verify_data(
        &self,
        finished_key: &[u8],
        transcript_hash: &[u8],
    ) -> Result<Vec<u8>, TlsError> {
        hmac_hash(self.params.hash, finished_key, transcript_hash)
    }

    /// Constant-time comparison of a received verify_data against the
    /// expected value.
    pub fn finished_matches(received: &[u8], expected: &[u8]) -> bool {
        received.len() == expected.len() && bool::from(received.ct_eq(expected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CipherSuite;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    fn to_hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    // RFC 8448 Section 3: Simple 1-RTT Handshake (TLS_AES_128_GCM_SHA256).
    // All hex values from the RFC example trace.

    #[test]
    fn test_full_key_schedule_sha256() {
        let params = CipherSuiteParams::from_suite(CipherSuite::TLS_AES_128_GCM_SHA256).unwrap();
        let mut ks = KeySchedule::new(params);

        // Step 1: Early Secret (no PSK → zero IKM)
        ks.derive_early_secret().unwrap();
        assert_eq!(ks.stage(), KeyScheduleStage::EarlySecret);
        let expected_early =
            hex("33ad0a1c607ec03b09e6cd9893680ce210adf300aa1f2660e1b22e10f170f92a");
        assert_eq!(to_hex(&ks.current_secret), to_hex(&expected_early));

        // Step 2: Handshake Secret (from DHE shared secret)
        let dhe_shared = hex("8bd4054fb55b9d63fdfbacf9f04b9f0d35e6d63f537563efd46272900f89492d");
        ks.derive_handshake_secret(&dhe_shared).unwrap();
        assert_eq!(ks.stage(), KeyScheduleStage::HandshakeSecret);

        let expected_hs = hex("1dc826e93606aa6fdc0aadc12f741b01046aa6b99f691ed221a9f0ca043fbeac");
        assert_eq!(to_hex(&ks.current_secret), to_hex(&expected_hs));

        // Step 3: Handshake traffic secrets from Hash(CH..SH)
        let transcript_ch_sh =
            hex("860c06edc07858ee8e78f0e7428c58edd6b43f2ca3e6e95f02ed063cf0e1cad8");
        let (client_hs, server_hs) = ks
            .derive_handshake_traffic_secrets(&transcript_ch_sh)
            .unwrap();

        let expected_client_hs =
            hex("b3eddb126e067f35a780b3abf45e2d8f3b1a950738f52e9600746a0e27a55a21");
        let expected_server_hs =
            hex("b67b7d690cc16c4e75e54213cb2d37b4e9c912bcded9105d42befd59d391ad38");
        assert_eq!(to_hex(&client_hs), to_hex(&expected_client_hs));
        assert_eq!(to_hex(&server_hs), to_hex(&expected_server_hs));

        // Step 4: Master Secret
        ks.derive_master_secret().unwrap();
        assert_eq!(ks.stage(), KeyScheduleStage::MasterSecret);
        let expected_ms = hex("18df06843d13a08bf2a449844c5f8a478001bc4d4c627984d5a41da8d0402919");
        assert_eq!(to_hex(&ks.current_secret), to_hex(&expected_ms));

        // Step 5: Application traffic secrets from Hash(CH..SF)
        let transcript_ch_sf =
            hex("9608102a0f1ccc6db6250b7b7e417b1a000eaada3daae4777a7686c9ff83df13");
        let (client_app, server_app) = ks.derive_app_traffic_secrets(&transcript_ch_sf).unwrap();

        let expected_client_app =
            hex("9e40646ce79a7f9dc05af8889bce6552875afa0b06df0087f792ebb7c17504a5");
        let expected_server_app =
            hex("a11af9f05531f856ad47116b45a950328204b4f44bfb6b3a4b4f1f3fcb631643");
        assert_eq!(to_hex(&client_app), to_hex(&expected_client_app));
        assert_eq!(to_hex(&server_app), to_hex(&expected_server_app));
    }

    /// RFC 8448 §3: server finished key derivation.
    #[test]
    fn test_finished_key_rfc8448() {
        let params = CipherSuiteParams::from_suite(CipherSuite::TLS_AES_128_GCM_SHA256).unwrap();
        let ks = KeySchedule::new(params);

        let server_hs_secret =
            hex("b67b7d690cc16c4e75e54213cb2d37b4e9c912bcded9105d42befd59d391ad38");
        let finished_key = ks.derive_finished_key(&server_hs_secret).unwrap();
        assert_eq!(
            to_hex(&finished_key),
            "008d3b66f816ea559f96b537e885c31fc068bf492c652f01f288a1d8cdc19fc8"
        );
    }

    #[test]
    fn test_finished_verify_data_deterministic() {
        let params = CipherSuiteParams::from_suite(CipherSuite::TLS_AES_128_GCM_SHA256).unwrap();
        let ks = KeySchedule::new(params);

        let finished_key = vec![0x42; 32];
        let transcript_hash = vec![0xAA; 32];
        let a = ks
            .compute_finished_verify_data(&finished_key, &transcript_hash)
            .unwrap();
        let b = ks
            .compute_finished_verify_data(&finished_key, &transcript_hash)
            .unwrap();
        assert_eq!(a, b);

        let other = ks
            .compute_finished_verify_data(&finished_key, &vec![0xBB; 32])
            .unwrap();
        assert_ne!(a, other);
    }

    #[test]
    fn test_finished_matches() {
        let a = vec![0x01, 0x02, 0x03];
        assert!(KeySchedule::finished_matches(&a, &[0x01, 0x02, 0x03]));
        assert!(!KeySchedule::finished_matches(&a, &[0x01, 0x02, 0x04]));
        assert!(!KeySchedule::finished_matches(&a, &[0x01, 0x02]));
    }

    #[test]
    fn test_stage_enforcement() {
        let params = CipherSuiteParams::from_suite(CipherSuite::TLS_AES_128_GCM_SHA256).unwrap();
        let mut ks = KeySchedule::new(params);

        // Each step requires its prerequisite stage
        assert!(matches!(
            ks.derive_handshake_secret(&[0u8; 32]),
            Err(TlsError::KeyScheduleNotReady(_))
        ));
        assert!(matches!(
            ks.derive_master_secret(),
            Err(TlsError::KeyScheduleNotReady(_))
        ));
        assert!(matches!(
            ks.derive_handshake_traffic_secrets(&[0u8; 32]),
            Err(TlsError::KeyScheduleNotReady(_))
        ));
        assert!(matches!(
            ks.derive_app_traffic_secrets(&[0u8; 32]),
            Err(TlsError::KeyScheduleNotReady(_))
        ));

        // Proper sequence works
        ks.derive_early_secret().unwrap();
        ks.derive_handshake_secret(&[0x42; 32]).unwrap();
        ks.derive_master_secret().unwrap();
        assert_eq!(ks.stage(), KeyScheduleStage::MasterSecret);

        // Re-deriving an earlier step is also rejected
        assert!(matches!(
            ks.derive_early_secret(),
            Err(TlsError::KeyScheduleNotReady(_))
        ));
    }

    #[test]
    fn test_invalid_shared_secret_length() {
        let params = CipherSuiteParams::from_suite(CipherSuite::TLS_AES_128_GCM_SHA256).unwrap();
        let mut ks = KeySchedule::new(params);
        ks.derive_early_secret().unwrap();
        assert!(matches!(
            ks.derive_handshake_secret(&[0x42; 16]),
            Err(TlsError::KeyExchangeFailed(_))
        ));
    }

    #[test]
    fn test_key_schedule_sha384() {
        let params = CipherSuiteParams::from_suite(CipherSuite::TLS_AES_256_GCM_SHA384).unwrap();
        let mut ks = KeySchedule::new(params);
        assert_eq!(ks.hash_len(), 48);

        ks.derive_early_secret().unwrap();
        assert_eq!(ks.current_secret.len(), 48);

        ks.derive_handshake_secret(&[0u8; 32]).unwrap();
        assert_eq!(ks.current_secret.len(), 48);

        let (client_hs, server_hs) = ks.derive_handshake_traffic_secrets(&[0u8; 48]).unwrap();
        assert_eq!(client_hs.len(), 48);
        assert_eq!(server_hs.len(), 48);
        assert_ne!(client_hs, server_hs);

        ks.derive_master_secret().unwrap();
        assert_eq!(ks.current_secret.len(), 48);
    }
}

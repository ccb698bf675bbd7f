//! TLS record layer: parsing, serialization, and AEAD protection.

pub mod protection;

use crate::crypt::traffic_keys::TrafficKeys;
use crate::CipherSuite;
use ferrite_types::TlsError;
use protection::{CipherState, LEGACY_RECORD_VERSION, MAX_EXPANSION, MAX_FRAGMENT};

/// TLS record content types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ContentType {
    ChangeCipherSpec = 20,
    Alert = 21,
    Handshake = 22,
    ApplicationData = 23,
}

impl ContentType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            20 => Some(Self::ChangeCipherSpec),
            21 => Some(Self::Alert),
            22 => Some(Self::Handshake),
            23 => Some(Self::ApplicationData),
            _ => None,
        }
    }
}

/// A parsed TLS record.
#[derive(Debug, Clone)]
pub struct Record {
    pub content_type: ContentType,
    pub version: u16,
    pub fragment: Vec<u8>,
}

/// Record layer state for reading and writing TLS records.
///
/// Starts in the plaintext epoch; `install_handshake_keys` and
/// `install_application_keys` swap both directions into the next epoch.
/// Write state protects client→server traffic, read state server→client.
pub struct RecordLayer {
    /// Maximum fragment size (default: 16384).
    pub max_fragment_size: usize,
    write_state: Option<CipherState>,
    read_state: Option<CipherState>,
}

impl RecordLayer {
    pub fn new() -> Self {
        Self {
            max_fragment_size: MAX_FRAGMENT,
            write_state: None,
            read_state: None,
        }
    }

    /// Returns true if write encryption is active.
    pub fn is_encrypting(&self) -> bool {
        self.write_state.is_some()
    }

    /// Returns true if read decryption is active.
    pub fn is_decrypting(&self) -> bool {
        self.read_state.is_some()
    }

    /// Install the handshake-epoch cipher states for both directions.
    ///
    /// Write uses the client keys, read the server keys; sequence numbers
    /// restart at 0 and the plaintext epoch ends.
    pub fn install_handshake_keys(
        &mut self,
        suite: CipherSuite,
        client_keys: &TrafficKeys,
        server_keys: &TrafficKeys,
    ) -> Result<(), TlsError> {
        self.install_keys(suite, client_keys, server_keys)
    }

    /// Install the application-epoch cipher states for both directions.
    ///
    /// Replaces the handshake epoch; previous keys are discarded.
    pub fn install_application_keys(
        &mut self,
        suite: CipherSuite,
        client_keys: &TrafficKeys,
        server_keys: &TrafficKeys,
    ) -> Result<(), TlsError> {
        self.install_keys(suite, client_keys, server_keys)
    }

    /// Swap both cipher states. Both are keyed before either is
    /// installed so a failure leaves the previous epoch intact.
    fn install_keys(
        &mut self,
        suite: CipherSuite,
        client_keys: &TrafficKeys,
        server_keys: &TrafficKeys,
    ) -> Result<(), TlsError> {
        let write = CipherState::new(suite, client_keys)?;
        let read = CipherState::new(suite, server_keys)?;
        self.write_state = Some(write);
        self.read_state = Some(read);
        Ok(())
    }

    /// Encrypt (if active) and serialize a record for sending.
    ///
    /// In the plaintext epoch the payload is framed as-is; afterwards it
    /// is sealed and travels as an outer application_data record.
    pub fn seal_record(
        &mut self,
        content_type: ContentType,
        plaintext: &[u8],
    ) -> Result<Vec<u8>, TlsError> {
        if plaintext.len() > self.max_fragment_size {
            return Err(TlsError::RecordError(
                "fragment exceeds the negotiated maximum".into(),
            ));
        }
        let record = match &mut self.write_state {
            Some(state) => Record {
                content_type: ContentType::ApplicationData,
                version: LEGACY_RECORD_VERSION,
                fragment: state.seal(content_type, plaintext)?,
            },
            None => Record {
                content_type,
                version: LEGACY_RECORD_VERSION,
                fragment: plaintext.to_vec(),
            },
        };
        Ok(self.serialize_record(&record))
    }

    /// Parse and optionally decrypt an incoming record.
    ///
    /// Returns (content_type, plaintext, bytes_consumed). Once read keys
    /// are installed, outer application_data records are opened and the
    /// inner content type returned; plaintext records (e.g. middlebox
    /// ChangeCipherSpec) pass through unchanged.
    pub fn open_record(&mut self, data: &[u8]) -> Result<(ContentType, Vec<u8>, usize), TlsError> {
        let (record, consumed) = self.parse_record(data)?;
        match &mut self.read_state {
            Some(state) if record.content_type == ContentType::ApplicationData => {
                let (ct, pt) = state.open(&record.fragment)?;
                Ok((ct, pt, consumed))
            }
            _ => Ok((record.content_type, record.fragment, consumed)),
        }
    }

    /// Parse a TLS record from the given bytes.
    pub fn parse_record(&self, data: &[u8]) -> Result<(Record, usize), TlsError> {
        if data.len() < 5 {
            return Err(TlsError::RecordError(
                "short of a full record header".into(),
            ));
        }

        let content_type = ContentType::from_byte(data[0]).ok_or_else(|| {
            TlsError::RecordError(format!("unrecognised record content type {}", data[0]))
        })?;
        let version = u16::from_be_bytes([data[1], data[2]]);
        let length = u16::from_be_bytes([data[3], data[4]]) as usize;

        if length > self.max_fragment_size + MAX_EXPANSION {
            return Err(TlsError::RecordError(
                "record length field over the limit".into(),
            ));
        }

        if data.len() < 5 + length {
            return Err(TlsError::RecordError("record body not yet complete".into()));
        }

        let fragment = data[5..5 + length].to_vec();
        Ok((
            Record {
                content_type,
                version,
                fragment,
            },
            5 + length,
        ))
    }

    /// Serialize a TLS record to bytes.
    pub fn serialize_record(&self, record: &Record) -> Vec<u8> {
        let mut buf = Vec::with_capacity(5 + record.fragment.len());
        buf.push(record.content_type as u8);
        buf.extend_from_slice(&record.version.to_be_bytes());
        buf.extend_from_slice(&(record.fragment.len() as u16).to_be_bytes());
        buf.extend_from_slice(&record.fragment);
        buf
    }
}

impl Default for RecordLayer {
    fn default() -> Self {
        Self::new()
    }
}

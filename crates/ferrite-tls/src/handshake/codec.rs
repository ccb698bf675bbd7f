//! TLS 1.3 handshake message encoding/decoding (RFC 8446 §4).
//!
//! Decoding works through a [`Reader`] cursor so every length check
//! lives in one place and truncation errors name the field that ran
//! dry. Encoding goes through closure-scoped length blocks
//! ([`u8_block`], [`u16_block`], [`u24_block`]) so a prefix can never
//! disagree with the bytes it covers.

use crate::crypt::SignatureScheme;
use crate::extensions::{Extension, ExtensionType};
use crate::CipherSuite;
use ferrite_types::TlsError;

use super::HandshakeType;

/// legacy_version pinned into ClientHello bodies (TLS 1.2 on the wire).
const LEGACY_HELLO_VERSION: u16 = 0x0303;

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Cursor over a message body.
///
/// Every accessor takes a field name so a truncated message reports
/// which field was being read when the bytes ran out.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

fn ran_dry(what: &'static str) -> TlsError {
    TlsError::HandshakeFailed(format!("message ended while reading {what}"))
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.buf.len()
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], TlsError> {
        if self.remaining() < n {
            return Err(ran_dry(what));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn u8(&mut self, what: &'static str) -> Result<u8, TlsError> {
        Ok(self.take(1, what)?[0])
    }

    pub fn u16(&mut self, what: &'static str) -> Result<u16, TlsError> {
        let b = self.take(2, what)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn u24(&mut self, what: &'static str) -> Result<usize, TlsError> {
        let b = self.take(3, what)?;
        Ok(((b[0] as usize) << 16) | ((b[1] as usize) << 8) | (b[2] as usize))
    }

    /// A field with a one-byte length prefix.
    pub fn bytes_u8(&mut self, what: &'static str) -> Result<&'a [u8], TlsError> {
        let len = self.u8(what)? as usize;
        self.take(len, what)
    }

    /// A field with a two-byte length prefix.
    pub fn bytes_u16(&mut self, what: &'static str) -> Result<&'a [u8], TlsError> {
        let len = self.u16(what)? as usize;
        self.take(len, what)
    }

    /// A field with a three-byte length prefix.
    pub fn bytes_u24(&mut self, what: &'static str) -> Result<&'a [u8], TlsError> {
        let len = self.u24(what)?;
        self.take(len, what)
    }
}

// ---------------------------------------------------------------------------
// Length-block writers
// ---------------------------------------------------------------------------

/// Run `fill`, then patch a one-byte length prefix over what it wrote.
pub(crate) fn u8_block(out: &mut Vec<u8>, fill: impl FnOnce(&mut Vec<u8>)) {
    out.push(0);
    let start = out.len();
    fill(out);
    let len = out.len() - start;
    debug_assert!(len <= u8::MAX as usize);
    out[start - 1] = len as u8;
}

/// Run `fill`, then patch a two-byte length prefix over what it wrote.
pub(crate) fn u16_block(out: &mut Vec<u8>, fill: impl FnOnce(&mut Vec<u8>)) {
    out.extend_from_slice(&[0, 0]);
    let start = out.len();
    fill(out);
    let len = out.len() - start;
    debug_assert!(len <= u16::MAX as usize);
    out[start - 2..start].copy_from_slice(&(len as u16).to_be_bytes());
}

/// Run `fill`, then patch a three-byte length prefix over what it wrote.
pub(crate) fn u24_block(out: &mut Vec<u8>, fill: impl FnOnce(&mut Vec<u8>)) {
    out.extend_from_slice(&[0, 0, 0]);
    let start = out.len();
    fill(out);
    let len = out.len() - start;
    debug_assert!(len < 1 << 24);
    out[start - 3] = (len >> 16) as u8;
    out[start - 2] = (len >> 8) as u8;
    out[start - 1] = len as u8;
}

// ---------------------------------------------------------------------------
// Handshake frames
// ---------------------------------------------------------------------------

/// One decoded handshake frame, borrowing its body from the input.
pub struct HandshakeFrame<'a> {
    pub msg_type: HandshakeType,
    pub body: &'a [u8],
}

/// Split a `type(1) || length(3) || body` frame off the front of `data`.
pub fn read_frame(data: &[u8]) -> Result<HandshakeFrame<'_>, TlsError> {
    let mut r = Reader::new(data);
    let type_byte = r.u8("handshake message type")?;
    let msg_type = HandshakeType::from_byte(type_byte).ok_or_else(|| {
        TlsError::HandshakeFailed(format!("unrecognised handshake message type {type_byte}"))
    })?;
    let body = r.bytes_u24("handshake message body")?;
    Ok(HandshakeFrame { msg_type, body })
}

/// Frame a handshake body with its type and 24-bit length.
pub fn frame_message(msg_type: HandshakeType, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + body.len());
    out.push(msg_type as u8);
    u24_block(&mut out, |b| b.extend_from_slice(body));
    out
}

// ---------------------------------------------------------------------------
// Extensions
// ---------------------------------------------------------------------------

/// Append one `type(2) || length(2) || data` extension.
pub(crate) fn put_extension(out: &mut Vec<u8>, ext: &Extension) {
    out.extend_from_slice(&ext.extension_type.0.to_be_bytes());
    u16_block(out, |b| b.extend_from_slice(&ext.data));
}

/// Read a two-byte-prefixed extension block; trailing bytes inside the
/// block are an error.
pub fn read_extensions(r: &mut Reader) -> Result<Vec<Extension>, TlsError> {
    let block = r.bytes_u16("extensions")?;
    let mut inner = Reader::new(block);
    let mut out = Vec::new();
    while !inner.is_empty() {
        let extension_type = ExtensionType(inner.u16("extension type")?);
        let data = inner.bytes_u16("extension data")?.to_vec();
        out.push(Extension {
            extension_type,
            data,
        });
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// ClientHello
// ---------------------------------------------------------------------------

/// Encode a ClientHello as a complete handshake message (header + body).
pub fn encode_client_hello(
    random: &[u8; 32],
    session_id: &[u8],
    suites: &[CipherSuite],
    extensions: &[Extension],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(192);
    body.extend_from_slice(&LEGACY_HELLO_VERSION.to_be_bytes());
    body.extend_from_slice(random);
    u8_block(&mut body, |b| b.extend_from_slice(session_id));
    u16_block(&mut body, |b| {
        for suite in suites {
            b.extend_from_slice(&suite.0.to_be_bytes());
        }
    });
    // legacy_compression_methods: the single null method
    u8_block(&mut body, |b| b.push(0));
    u16_block(&mut body, |b| {
        for ext in extensions {
            put_extension(b, ext);
        }
    });
    frame_message(HandshakeType::ClientHello, &body)
}

// ---------------------------------------------------------------------------
// ServerHello
// ---------------------------------------------------------------------------

/// The pieces of a ServerHello this client acts on.
#[derive(Debug, Clone)]
pub struct ServerHello {
    pub legacy_version: u16,
    pub cipher_suite: CipherSuite,
    pub extensions: Vec<Extension>,
}

/// Decode a ServerHello from handshake body bytes (after the header).
pub fn decode_server_hello(body: &[u8]) -> Result<ServerHello, TlsError> {
    let mut r = Reader::new(body);
    let legacy_version = r.u16("ServerHello legacy_version")?;
    r.take(32, "ServerHello random")?;
    r.bytes_u8("ServerHello session_id echo")?;
    let cipher_suite = CipherSuite(r.u16("ServerHello cipher_suite")?);
    if r.u8("ServerHello compression")? != 0 {
        return Err(TlsError::HandshakeFailed(
            "ServerHello selected a non-null compression method".into(),
        ));
    }
    let extensions = if r.is_empty() {
        Vec::new()
    } else {
        read_extensions(&mut r)?
    };
    Ok(ServerHello {
        legacy_version,
        cipher_suite,
        extensions,
    })
}

// ---------------------------------------------------------------------------
// EncryptedExtensions
// ---------------------------------------------------------------------------

/// Decode an EncryptedExtensions body into its extension list.
pub fn decode_encrypted_extensions(body: &[u8]) -> Result<Vec<Extension>, TlsError> {
    read_extensions(&mut Reader::new(body))
}

// ---------------------------------------------------------------------------
// Certificate
// ---------------------------------------------------------------------------

/// Decode a Certificate body into the DER chain, leaf first.
///
/// Per-entry extensions (OCSP staples, SCTs) are stepped over; chain
/// validation is not this layer's concern.
pub fn decode_certificate_chain(body: &[u8]) -> Result<Vec<Vec<u8>>, TlsError> {
    let mut r = Reader::new(body);
    r.bytes_u8("certificate_request_context")?;
    let list = r.bytes_u24("certificate_list")?;

    let mut entries = Reader::new(list);
    let mut chain = Vec::new();
    while !entries.is_empty() {
        let cert = entries.bytes_u24("certificate entry")?;
        entries.bytes_u16("certificate entry extensions")?;
        chain.push(cert.to_vec());
    }
    Ok(chain)
}

/// Encode a Certificate message carrying the given DER chain.
pub fn encode_certificate_chain(context: &[u8], chain: &[&[u8]]) -> Vec<u8> {
    let mut body = Vec::new();
    u8_block(&mut body, |b| b.extend_from_slice(context));
    u24_block(&mut body, |b| {
        for cert in chain {
            u24_block(b, |b| b.extend_from_slice(cert));
            u16_block(b, |_| {}); // no per-entry extensions
        }
    });
    frame_message(HandshakeType::Certificate, &body)
}

// ---------------------------------------------------------------------------
// CertificateVerify
// ---------------------------------------------------------------------------

/// Decode a CertificateVerify body into (scheme, signature).
pub fn decode_certificate_verify(body: &[u8]) -> Result<(SignatureScheme, Vec<u8>), TlsError> {
    let mut r = Reader::new(body);
    let scheme = SignatureScheme(r.u16("CertificateVerify algorithm")?);
    let signature = r.bytes_u16("CertificateVerify signature")?.to_vec();
    Ok((scheme, signature))
}

/// Encode a CertificateVerify message.
pub fn encode_certificate_verify(scheme: SignatureScheme, signature: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(4 + signature.len());
    body.extend_from_slice(&scheme.0.to_be_bytes());
    u16_block(&mut body, |b| b.extend_from_slice(signature));
    frame_message(HandshakeType::CertificateVerify, &body)
}

// ---------------------------------------------------------------------------
// Finished
// ---------------------------------------------------------------------------

/// Decode a Finished body. The verify_data fills the whole body and must
/// be exactly one hash output long.
pub fn decode_finished(body: &[u8], hash_len: usize) -> Result<Vec<u8>, TlsError> {
    if body.len() != hash_len {
        return Err(TlsError::HandshakeFailed(format!(
            "Finished carries {} bytes of verify_data, expected {hash_len}",
            body.len()
        )));
    }
    Ok(body.to_vec())
}

/// Encode a Finished message around the given verify_data.
pub fn encode_finished(verify_data: &[u8]) -> Vec<u8> {
    frame_message(HandshakeType::Finished, verify_data)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

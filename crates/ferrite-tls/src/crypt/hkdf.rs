//! TLS 1.3 HKDF primitives (RFC 8446 Section 7.1).
//!
//! Thin dispatch over the `hkdf`/`hmac` crates so the same call sites
//! serve both SHA-256 and SHA-384 suites.

use super::HashAlgorithm;
use ferrite_types::TlsError;
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384};

/// One-shot HMAC: `HMAC-Hash(key, data)`.
pub fn hmac_hash(hash: HashAlgorithm, key: &[u8], data: &[u8]) -> Result<Vec<u8>, TlsError> {
    match hash {
        HashAlgorithm::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(key)
                .map_err(|e| TlsError::CryptoError(format!("hmac key: {e}")))?;
            mac.update(data);
            Ok(mac.finalize().into_bytes().to_vec())
        }
        HashAlgorithm::Sha384 => {
            let mut mac = Hmac::<Sha384>::new_from_slice(key)
                .map_err(|e| TlsError::CryptoError(format!("hmac key: {e}")))?;
            mac.update(data);
            Ok(mac.finalize().into_bytes().to_vec())
        }
    }
}

/// HKDF-Extract(salt, IKM) -> PRK.
///
/// An empty salt is equivalent to `hash_len` zero bytes (RFC 5869).
pub fn hkdf_extract(hash: HashAlgorithm, salt: &[u8], ikm: &[u8]) -> Vec<u8> {
    match hash {
        HashAlgorithm::Sha256 => {
            let (prk, _) = hkdf::Hkdf::<Sha256>::extract(Some(salt), ikm);
            prk.to_vec()
        }
        HashAlgorithm::Sha384 => {
            let (prk, _) = hkdf::Hkdf::<Sha384>::extract(Some(salt), ikm);
            prk.to_vec()
        }
    }
}

/// HKDF-Expand(PRK, info, length) -> OKM.
pub fn hkdf_expand(
    hash: HashAlgorithm,
    prk: &[u8],
    info: &[u8],
    length: usize,
) -> Result<Vec<u8>, TlsError> {
    let mut okm = vec![0u8; length];
    match hash {
        HashAlgorithm::Sha256 => hkdf::Hkdf::<Sha256>::from_prk(prk)
            .map_err(|e| TlsError::CryptoError(format!("hkdf prk: {e}")))?
            .expand(info, &mut okm)
            .map_err(|e| TlsError::CryptoError(format!("hkdf expand: {e}")))?,
        HashAlgorithm::Sha384 => hkdf::Hkdf::<Sha384>::from_prk(prk)
            .map_err(|e| TlsError::CryptoError(format!("hkdf prk: {e}")))?
            .expand(info, &mut okm)
            .map_err(|e| TlsError::CryptoError(format!("hkdf expand: {e}")))?,
    }
    Ok(okm)
}

/// Encode the HkdfLabel structure per RFC 8446 Section 7.1:
///
/// ```text
/// struct {
///     uint16 length;
///     opaque label<7..255>;   // "tls13 " + label
///     opaque context<0..255>;
/// } HkdfLabel;
/// ```
fn encode_hkdf_label(length: u16, label: &[u8], context: &[u8]) -> Vec<u8> {
    let full_label_len = 6 + label.len(); // "tls13 " prefix = 6 bytes
    let mut buf = Vec::with_capacity(2 + 1 + full_label_len + 1 + context.len());
    buf.extend_from_slice(&length.to_be_bytes());
    buf.push(full_label_len as u8);
    buf.extend_from_slice(b"tls13 ");
    buf.extend_from_slice(label);
    buf.push(context.len() as u8);
    buf.extend_from_slice(context);
    buf
}

/// HKDF-Expand-Label(Secret, Label, Context, Length).
///
/// `= HKDF-Expand(Secret, HkdfLabel, Length)`
pub fn hkdf_expand_label(
    hash: HashAlgorithm,
    secret: &[u8],
    label: &[u8],
    context: &[u8],
    length: usize,
) -> Result<Vec<u8>, TlsError> {
    let hkdf_label = encode_hkdf_label(length as u16, label, context);
    hkdf_expand(hash, secret, &hkdf_label, length)
}

/// Derive-Secret(Secret, Label, TranscriptHash).
///
/// `= HKDF-Expand-Label(Secret, Label, TranscriptHash, Hash.length)`
///
/// `transcript_hash` is the already-computed hash of the messages.
pub fn derive_secret(
    hash: HashAlgorithm,
    secret: &[u8],
    label: &[u8],
    transcript_hash: &[u8],
) -> Result<Vec<u8>, TlsError> {
    hkdf_expand_label(hash, secret, label, transcript_hash, hash.output_len())
}

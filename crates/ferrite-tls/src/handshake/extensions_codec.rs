//! TLS 1.3 extension payload encoding/decoding for ClientHello,
//! ServerHello and EncryptedExtensions.
//!
//! Built on the codec module's length-block writers and [`Reader`]
//! cursor, so the wire layouts here stay declarative.

use super::codec::{u16_block, u8_block, Reader};
use crate::crypt::{NamedGroup, SignatureScheme};
use crate::extensions::{Extension, ExtensionType};
use ferrite_types::TlsError;

// ---------------------------------------------------------------------------
// ClientHello builders
// ---------------------------------------------------------------------------

/// `supported_versions` for ClientHello: TLS 1.3 alone. Offering 1.2 as
/// well would invite version-confused downgrades into suites this client
/// lacks.
pub fn build_supported_versions_ch() -> Extension {
    let mut data = Vec::new();
    u8_block(&mut data, |versions| {
        versions.extend_from_slice(&[0x03, 0x04]);
    });
    Extension {
        extension_type: ExtensionType::SUPPORTED_VERSIONS,
        data,
    }
}

/// `supported_groups`: the named groups offered for key exchange.
pub fn build_supported_groups(groups: &[NamedGroup]) -> Extension {
    let mut data = Vec::new();
    u16_block(&mut data, |list| {
        for group in groups {
            list.extend_from_slice(&group.0.to_be_bytes());
        }
    });
    Extension {
        extension_type: ExtensionType::SUPPORTED_GROUPS,
        data,
    }
}

/// `signature_algorithms`: schemes acceptable in CertificateVerify.
pub fn build_signature_algorithms(schemes: &[SignatureScheme]) -> Extension {
    let mut data = Vec::new();
    u16_block(&mut data, |list| {
        for scheme in schemes {
            list.extend_from_slice(&scheme.0.to_be_bytes());
        }
    });
    Extension {
        extension_type: ExtensionType::SIGNATURE_ALGORITHMS,
        data,
    }
}

/// `key_share` for ClientHello: a single entry carrying our public key.
pub fn build_key_share_ch(group: NamedGroup, public_key: &[u8]) -> Extension {
    let mut data = Vec::new();
    u16_block(&mut data, |shares| {
        shares.extend_from_slice(&group.0.to_be_bytes());
        u16_block(shares, |key| key.extend_from_slice(public_key));
    });
    Extension {
        extension_type: ExtensionType::KEY_SHARE,
        data,
    }
}

/// `server_name` (SNI): one host_name entry.
pub fn build_server_name(hostname: &str) -> Extension {
    let mut data = Vec::new();
    u16_block(&mut data, |list| {
        list.push(0); // name type: host_name
        u16_block(list, |name| name.extend_from_slice(hostname.as_bytes()));
    });
    Extension {
        extension_type: ExtensionType::SERVER_NAME,
        data,
    }
}

/// `psk_key_exchange_modes` (RFC 8446 §4.2.9): psk_dhe_ke only.
pub fn build_psk_key_exchange_modes() -> Extension {
    let mut data = Vec::new();
    u8_block(&mut data, |modes| modes.push(1));
    Extension {
        extension_type: ExtensionType::PSK_KEY_EXCHANGE_MODES,
        data,
    }
}

/// `application_layer_protocol_negotiation` with the offered protocols.
pub fn build_alpn(protocols: &[Vec<u8>]) -> Extension {
    let mut data = Vec::new();
    u16_block(&mut data, |list| {
        for proto in protocols {
            u8_block(list, |name| name.extend_from_slice(proto));
        }
    });
    Extension {
        extension_type: ExtensionType::APPLICATION_LAYER_PROTOCOL_NEGOTIATION,
        data,
    }
}

// ---------------------------------------------------------------------------
// ServerHello / EncryptedExtensions parsers
// ---------------------------------------------------------------------------

/// `supported_versions` from ServerHello: the single selected version.
pub fn parse_supported_versions_sh(data: &[u8]) -> Result<u16, TlsError> {
    Reader::new(data).u16("selected version")
}

/// `key_share` from ServerHello: one entry, no list prefix.
/// Returns (group, public key bytes).
pub fn parse_key_share_sh(data: &[u8]) -> Result<(NamedGroup, Vec<u8>), TlsError> {
    let mut r = Reader::new(data);
    let group = NamedGroup(r.u16("key_share group")?);
    let key = r.bytes_u16("key_share key_exchange")?.to_vec();
    Ok((group, key))
}

/// ALPN from EncryptedExtensions: exactly one selected protocol.
pub fn parse_alpn_sh(data: &[u8]) -> Result<Vec<u8>, TlsError> {
    let mut r = Reader::new(data);
    let mut list = Reader::new(r.bytes_u16("alpn protocol list")?);
    let proto = list.bytes_u8("alpn protocol")?.to_vec();
    if !list.is_empty() {
        return Err(TlsError::HandshakeFailed(
            "server selected more than one ALPN protocol".into(),
        ));
    }
    Ok(proto)
}

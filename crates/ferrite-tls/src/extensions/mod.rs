//! TLS extensions (SNI, ALPN, supported_versions, key_share, ...).

/// TLS extension type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionType(pub u16);

impl ExtensionType {
    pub const SERVER_NAME: Self = Self(0);
    pub const SUPPORTED_GROUPS: Self = Self(10);
    pub const SIGNATURE_ALGORITHMS: Self = Self(13);
    pub const APPLICATION_LAYER_PROTOCOL_NEGOTIATION: Self = Self(16);
    pub const SUPPORTED_VERSIONS: Self = Self(43);
    pub const PSK_KEY_EXCHANGE_MODES: Self = Self(45);
    pub const KEY_SHARE: Self = Self(51);
}

/// A raw TLS extension.
#[derive(Debug, Clone)]
pub struct Extension {
    pub extension_type: ExtensionType,
    pub data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_type_wire_values() {
        // RFC 8446 §4.2 registry values
        assert_eq!(ExtensionType::SERVER_NAME.0, 0);
        assert_eq!(ExtensionType::SUPPORTED_GROUPS.0, 10);
        assert_eq!(ExtensionType::SIGNATURE_ALGORITHMS.0, 13);
        assert_eq!(ExtensionType::APPLICATION_LAYER_PROTOCOL_NEGOTIATION.0, 16);
        assert_eq!(ExtensionType::SUPPORTED_VERSIONS.0, 43);
        assert_eq!(ExtensionType::PSK_KEY_EXCHANGE_MODES.0, 45);
        assert_eq!(ExtensionType::KEY_SHARE.0, 51);
    }
}

/// TLS protocol errors.
///
/// Variants group into five kinds: transport (`Io`, `UnexpectedEof`,
/// `ConnectFailed`), protocol (`HandshakeFailed`, `RecordError`,
/// `IllegalTransition`, `UnsupportedVersion`), crypto
/// (`KeyScheduleNotReady`, `KeyExchangeFailed`, `FinishedVerifyFailed`,
/// `BadRecordMac`, `UnsupportedSuite`, `CryptoError`), configuration
/// (`ConfigError`) and API misuse (`UsageError`). All are fatal for the
/// connection except `UsageError`, which is fatal only for the call.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected eof")]
    UnexpectedEof,
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    #[error("handshake failed: {0}")]
    HandshakeFailed(String),
    #[error("record layer error: {0}")]
    RecordError(String),
    #[error("illegal state transition: {0}")]
    IllegalTransition(String),
    #[error("unsupported protocol version")]
    UnsupportedVersion,

    #[error("key schedule not ready: {0}")]
    KeyScheduleNotReady(&'static str),
    #[error("key exchange failed: {0}")]
    KeyExchangeFailed(String),
    #[error("finished verify_data mismatch")]
    FinishedVerifyFailed,
    #[error("bad record mac")]
    BadRecordMac,
    #[error("unsupported cipher suite")]
    UnsupportedSuite,
    #[error("crypto error: {0}")]
    CryptoError(String),

    #[error("invalid configuration: {0}")]
    ConfigError(String),

    #[error("invalid usage: {0}")]
    UsageError(&'static str),
}

impl TlsError {
    /// Whether the error is fatal for the whole connection.
    ///
    /// `UsageError` fails only the offending call; everything else
    /// poisons the connection.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TlsError::UsageError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_transport_variants() {
        assert_eq!(TlsError::UnexpectedEof.to_string(), "unexpected eof");
        assert_eq!(
            TlsError::ConnectFailed("refused".into()).to_string(),
            "connect failed: refused"
        );
    }

    #[test]
    fn test_display_protocol_variants() {
        assert_eq!(
            TlsError::HandshakeFailed("bad message".into()).to_string(),
            "handshake failed: bad message"
        );
        assert_eq!(
            TlsError::RecordError("overflow".into()).to_string(),
            "record layer error: overflow"
        );
        assert_eq!(
            TlsError::IllegalTransition("Idle -> WaitFinished".into()).to_string(),
            "illegal state transition: Idle -> WaitFinished"
        );
        assert_eq!(
            TlsError::UnsupportedVersion.to_string(),
            "unsupported protocol version"
        );
    }

    #[test]
    fn test_display_crypto_variants() {
        assert_eq!(
            TlsError::KeyScheduleNotReady("derive_handshake_secret").to_string(),
            "key schedule not ready: derive_handshake_secret"
        );
        assert_eq!(
            TlsError::KeyExchangeFailed("all-zero shared secret".into()).to_string(),
            "key exchange failed: all-zero shared secret"
        );
        assert_eq!(
            TlsError::FinishedVerifyFailed.to_string(),
            "finished verify_data mismatch"
        );
        assert_eq!(TlsError::BadRecordMac.to_string(), "bad record mac");
        assert_eq!(
            TlsError::UnsupportedSuite.to_string(),
            "unsupported cipher suite"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let tls: TlsError = io.into();
        assert!(tls.to_string().contains("refused"), "got: {tls}");
    }

    #[test]
    fn test_fatality() {
        assert!(!TlsError::UsageError("send before connect").is_fatal());
        assert!(TlsError::UnexpectedEof.is_fatal());
        assert!(TlsError::FinishedVerifyFailed.is_fatal());
        assert!(TlsError::ConfigError("no ciphers".into()).is_fatal());
    }

    #[test]
    fn test_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TlsError>();
    }
}

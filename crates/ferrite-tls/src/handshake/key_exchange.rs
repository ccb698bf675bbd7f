//! TLS 1.3 ephemeral key exchange (X25519).

use crate::crypt::NamedGroup;
use ferrite_types::TlsError;
use subtle::ConstantTimeEq;

/// Ephemeral key exchange state for a TLS handshake.
///
/// The private scalar lives for one connection; `x25519_dalek` wipes it
/// on drop.
pub struct KeyExchange {
    group: NamedGroup,
    private_key: x25519_dalek::StaticSecret,
    public_key: x25519_dalek::PublicKey,
}

impl KeyExchange {
    /// Generate a new ephemeral keypair for the given named group.
    ///
    /// Only X25519 is supported for key exchange; the other advertised
    /// groups are offered for negotiation completeness only.
    pub fn generate(group: NamedGroup) -> Result<Self, TlsError> {
        match group {
            NamedGroup::X25519 => {
                let mut seed = [0u8; 32];
                getrandom::getrandom(&mut seed).map_err(|e| {
                    TlsError::KeyExchangeFailed(format!("random generation failed: {e}"))
                })?;
                let private_key = x25519_dalek::StaticSecret::from(seed);
                let public_key = x25519_dalek::PublicKey::from(&private_key);
                Ok(Self {
                    group,
                    private_key,
                    public_key,
                })
            }
            _ => Err(TlsError::KeyExchangeFailed(format!(
                "unsupported named group: {group:?}"
            ))),
        }
    }

    /// The named group for this key exchange.
    pub fn group(&self) -> NamedGroup {
        self.group
    }

    /// The public key bytes to include in the key_share extension.
    pub fn public_key_bytes(&self) -> &[u8] {
        self.public_key.as_bytes()
    }

    /// Compute the shared secret from the peer's public key.
    ///
    /// The peer key must be exactly 32 bytes and the resulting secret
    /// must be non-zero (a zero output means the peer supplied a
    /// low-order point).
    pub fn compute_shared_secret(&self, peer_public: &[u8]) -> Result<[u8; 32], TlsError> {
        let peer: [u8; 32] = peer_public.try_into().map_err(|_| {
            TlsError::KeyExchangeFailed(format!(
                "peer public key must be 32 bytes, got {}",
                peer_public.len()
            ))
        })?;
        let shared = self
            .private_key
            .diffie_hellman(&x25519_dalek::PublicKey::from(peer));
        let bytes = *shared.as_bytes();
        if bool::from(bytes.ct_eq(&[0u8; 32])) {
            return Err(TlsError::KeyExchangeFailed(
                "all-zero shared secret".into(),
            ));
        }
        Ok(bytes)
    }
}

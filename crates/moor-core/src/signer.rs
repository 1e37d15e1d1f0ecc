//! Signing context shared by every orchestrator within one run. Read-only
//! after construction.

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ed25519_dalek::{Signer as _, SigningKey};

use crate::types::Address;

/// Ed25519 signing context plus the sender address transactions are sent
/// from.
pub struct Signer {
    key: SigningKey,
    address: Address,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.debug_struct("Signer")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Signer {
    /// Build a signer from a base64-encoded 32-byte secret key and the
    /// account address it controls.
    pub fn from_base64(secret: &str, address: impl Into<String>) -> anyhow::Result<Self> {
        let bytes = BASE64
            .decode(secret.trim())
            .context("secret key is not valid base64")?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| anyhow::anyhow!("secret key must decode to exactly 32 bytes"))?;
        Ok(Self {
            key: SigningKey::from_bytes(&bytes),
            address: address.into(),
        })
    }

    /// Fresh random signer with a pubkey-derived address.
    #[cfg(test)]
    fn random() -> Self {
        let key = SigningKey::generate(&mut rand::rngs::OsRng);
        let address = format!("0x{}", hex::encode(key.verifying_key().to_bytes()));
        Self { key, address }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Sign a payload, returning the base64 signature the RPC layer submits.
    pub fn sign(&self, payload: &[u8]) -> String {
        BASE64.encode(self.key.sign(payload).to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_base64_round_trips_a_generated_key() {
        let secret = BASE64.encode([7u8; 32]);
        let signer = Signer::from_base64(&secret, "0xme").unwrap();
        assert_eq!(signer.address(), "0xme");
        assert!(!signer.sign(b"payload").is_empty());
    }

    #[test]
    fn rejects_wrong_length_secrets() {
        let short = BASE64.encode([7u8; 16]);
        assert!(Signer::from_base64(&short, "0xme").is_err());
        assert!(Signer::from_base64("not base64!!", "0xme").is_err());
    }

    #[test]
    fn signing_is_deterministic_per_key() {
        let secret = BASE64.encode([9u8; 32]);
        let a = Signer::from_base64(&secret, "0xme").unwrap();
        let b = Signer::from_base64(&secret, "0xme").unwrap();
        assert_eq!(a.sign(b"tx"), b.sign(b"tx"));
    }

    #[test]
    fn debug_output_hides_key_material() {
        let rendered = format!("{:?}", Signer::random());
        assert!(rendered.contains("address"));
        assert!(!rendered.contains("key:"));
    }
}

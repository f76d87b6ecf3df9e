/*
[INPUT]:  Transaction hashes and optional secret key bytes
[OUTPUT]: `ed25519:`-prefixed base58 public keys and signatures
[POS]:    Wallet side - key material held by the loopback wallet
[UPDATE]: When changing signing algorithm or key string format
*/

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier};
use rand::rngs::OsRng;

use crate::types::CryptoHash;

const KEY_TYPE_PREFIX: &str = "ed25519:";

/// Ed25519 key the wallet signs transaction hashes with
#[derive(Debug)]
pub struct WalletKey {
    signing_key: SigningKey,
}

impl WalletKey {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Create from existing secret key bytes
    pub fn from_secret_key(bytes: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(bytes),
        }
    }

    /// `ed25519:<base58>` public key
    pub fn public_key(&self) -> String {
        let verifying_key = self.signing_key.verifying_key();
        format!(
            "{KEY_TYPE_PREFIX}{}",
            bs58::encode(verifying_key.as_bytes()).into_string()
        )
    }

    /// Sign a transaction hash, returning `ed25519:<base58 signature>`
    pub fn sign_hash(&self, hash: &CryptoHash) -> String {
        let signature = self.signing_key.sign(hash.as_bytes());
        format!(
            "{KEY_TYPE_PREFIX}{}",
            bs58::encode(signature.to_bytes()).into_string()
        )
    }

    /// Check a signature string produced by [`WalletKey::sign_hash`]
    pub fn verify_hash(&self, hash: &CryptoHash, signature: &str) -> bool {
        let Some(encoded) = signature.strip_prefix(KEY_TYPE_PREFIX) else {
            return false;
        };
        let Ok(bytes) = bs58::decode(encoded).into_vec() else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(&bytes) else {
            return false;
        };
        self.signing_key
            .verifying_key()
            .verify(hash.as_bytes(), &signature)
            .is_ok()
    }
}

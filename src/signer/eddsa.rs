//! L2 signing: EdDSA over Baby-Jubjub with a Poseidon challenge.

use std::fmt;

use babyjubjub_eddsa::{PrivateKey, PublicKey, Signature};
use poseidon_bn254::Fr;

use crate::error::{KeyError, Result};

pub struct EddsaSigner {
    key: PrivateKey,
    public_key: PublicKey,
}

impl EddsaSigner {
    pub fn new(key: PrivateKey) -> Self {
        let public_key = key.public_key();
        Self { key, public_key }
    }

    /// Parses a hex scalar, `0x` optional. Zero and scalars `>= L` are rejected.
    pub fn from_hex(private_key_hex: &str) -> std::result::Result<Self, KeyError> {
        let key = PrivateKey::from_hex(private_key_hex.trim())
            .map_err(|e| KeyError::InvalidL2Key(e.to_string()))?;
        Ok(Self::new(key))
    }

    /// Fresh random key from the OS RNG.
    pub fn generate() -> Self {
        Self::new(PrivateKey::generate())
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Public key as `(x, y)` lower-case hex, each 32 bytes.
    pub fn public_key_hex(&self) -> (String, String) {
        (self.public_key.x().to_hex(), self.public_key.y().to_hex())
    }

    pub fn sign(&self, message: &Fr) -> Result<Signature> {
        Ok(self.key.sign(message)?)
    }

    pub fn verify(&self, message: &Fr, signature: &Signature) -> Result<bool> {
        Ok(self.public_key.verify(message, signature)?)
    }
}

impl fmt::Debug for EddsaSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y) = self.public_key_hex();
        f.debug_struct("EddsaSigner")
            .field("public_key_x", &x)
            .field("public_key_y", &y)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub const TEST_L2_PRIVATE_KEY: &str = "0x4a3d1e098350";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_key_vector() {
        let signer = EddsaSigner::from_hex(TEST_L2_PRIVATE_KEY).unwrap();
        let (x, y) = signer.public_key_hex();
        assert_eq!(x, "0x1cf81ccfd46e2b6291f1c210c1e70d0905d9a0d3b8d5c9822fdd907d62b5158c");
        assert_eq!(y, "0x1c01126214b7063f4999fc724952b0fb7668c423ceffa6f1d92e6924a11b78d8");
    }

    #[test]
    fn test_zero_and_garbage_keys_rejected() {
        assert!(matches!(EddsaSigner::from_hex("0x0"), Err(KeyError::InvalidL2Key(_))));
        assert!(matches!(EddsaSigner::from_hex("0xnothex"), Err(KeyError::InvalidL2Key(_))));
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = EddsaSigner::from_hex("0x5").unwrap();
        let message = Fr::from_u64(360292934);
        let sig = signer.sign(&message).unwrap();
        assert!(signer.verify(&message, &sig).unwrap());
        assert!(!signer.verify(&Fr::from_u64(360292935), &sig).unwrap());
    }

    #[test]
    fn test_generated_keys_differ() {
        let a = EddsaSigner::generate();
        let b = EddsaSigner::generate();
        assert_ne!(a.public_key(), b.public_key());
        let message = Fr::from_u64(1);
        assert!(a.verify(&message, &a.sign(&message).unwrap()).unwrap());
    }

    #[test]
    fn test_debug_shows_public_key_only() {
        let dbg = format!("{:?}", EddsaSigner::from_hex(TEST_L2_PRIVATE_KEY).unwrap());
        assert!(dbg.contains("public_key_x"));
        assert!(!dbg.contains("4a3d1e098350"));
    }
}

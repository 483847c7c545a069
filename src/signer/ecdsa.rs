//! L1 signing: secp256k1 ECDSA over EIP-712 digests and EIP-191 personal messages.

use std::fmt;

use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Signature, H256};
use ethers::utils::hash_message;

use crate::error::{CodecError, KeyError};

pub struct EcdsaSigner {
    wallet: LocalWallet,
}

impl EcdsaSigner {
    /// Parses a 32-byte hex private key, `0x` optional.
    pub fn from_hex(private_key_hex: &str) -> Result<Self, KeyError> {
        let wallet: LocalWallet = private_key_hex
            .trim()
            .parse()
            .map_err(|e| KeyError::InvalidL1Key(format!("{}", e)))?;
        Ok(Self { wallet })
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Signs a 32-byte digest as-is (EIP-712 flow).
    pub fn sign_digest(&self, digest: H256) -> Result<Signature, KeyError> {
        let signature = self
            .wallet
            .sign_hash(digest)
            .map_err(|e| KeyError::Signing(format!("{}", e)))?;
        normalize_v(signature)
    }

    /// Signs `message` under the `"\x19Ethereum Signed Message:\n" + len` prefix.
    pub fn sign_personal_message(&self, message: impl AsRef<[u8]>) -> Result<Signature, KeyError> {
        self.sign_digest(hash_message(message))
    }
}

impl fmt::Debug for EcdsaSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcdsaSigner")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Normalizes `v` to 27/28; recovery ids 0/1 are shifted, anything else is rejected.
pub fn normalize_v(mut signature: Signature) -> Result<Signature, KeyError> {
    match signature.v {
        0 | 1 => signature.v += 27,
        27 | 28 => {}
        v => {
            return Err(KeyError::Signing(format!(
                "Invalid signature v value: {} (expected 0, 1, 27, or 28)",
                v
            )))
        }
    }
    Ok(signature)
}

/// Address that produced `signature` over the raw `digest`.
pub fn recover_digest(signature: &Signature, digest: H256) -> Result<Address, CodecError> {
    signature
        .recover(digest)
        .map_err(|e| CodecError::Recovery(format!("{}", e)))
}

/// Address that produced `signature` over the EIP-191 prefixed `message`.
pub fn recover_personal_message(
    signature: &Signature,
    message: impl AsRef<[u8]>,
) -> Result<Address, CodecError> {
    recover_digest(signature, hash_message(message))
}

/// True if `signature` over `digest` recovers to `expected`.
pub fn verify_digest(signature: &Signature, digest: H256, expected: Address) -> bool {
    recover_digest(signature, digest).is_ok_and(|addr| addr == expected)
}

#[cfg(test)]
pub const TEST_L1_PRIVATE_KEY: &str =
    "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

//! Private keys from the environment
//!
//! `L1_PRIVATE_KEY` is the secp256k1 key of the account owner, `L2_PRIVATE_KEY`
//! the Baby-Jubjub EdDSA key registered on the exchange. Either may be left
//! unset, but not both.

use std::fmt;

use super::logging::SanitizedValue;
use crate::error::{ConfigError, KeyError};
use crate::signer::SignerPair;

pub const L1_KEY_VAR: &str = "L1_PRIVATE_KEY";
pub const L2_KEY_VAR: &str = "L2_PRIVATE_KEY";

// =============================================================================
// Test Constants (well-known public keys, DO NOT USE IN PROD)
// =============================================================================

#[cfg(test)]
pub const TEST_L1_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

#[cfg(test)]
pub const TEST_L2_KEY: &str = "0x4a3d1e098350";

#[derive(Clone, Default)]
pub struct KeyConfig {
    pub l1_private_key: Option<String>,
    pub l2_private_key: Option<String>,
}

fn read_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl KeyConfig {
    /// Reads both key variables; empty values count as unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            l1_private_key: read_var(L1_KEY_VAR),
            l2_private_key: read_var(L2_KEY_VAR),
        };
        if config.l1_private_key.is_none() && config.l2_private_key.is_none() {
            return Err(ConfigError::Invalid(format!(
                "neither {} nor {} is set",
                L1_KEY_VAR, L2_KEY_VAR
            )));
        }
        tracing::debug!(
            l1 = config.l1_private_key.is_some(),
            l2 = config.l2_private_key.is_some(),
            "Loaded signing keys"
        );
        Ok(config)
    }

    /// Parses the configured keys into signers.
    pub fn signer_pair(&self) -> Result<SignerPair, KeyError> {
        SignerPair::from_hex(self.l1_private_key.as_deref(), self.l2_private_key.as_deref())
    }
}

impl fmt::Debug for KeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyConfig")
            .field("l1_private_key", &self.l1_private_key.as_deref().map(SanitizedValue::new))
            .field("l2_private_key", &self.l2_private_key.as_deref().map(SanitizedValue::new))
            .finish()
    }
}

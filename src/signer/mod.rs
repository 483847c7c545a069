//! Signing keys for both layers
//!
//! A `SignerPair` holds at most one key per layer. Either side may be absent
//! (an L2-only API client has no L1 key), in which case asking for it fails
//! with `KeyError::Missing` instead of panicking.

pub mod ecdsa;
pub mod eddsa;

pub use ecdsa::EcdsaSigner;
pub use eddsa::EddsaSigner;

use crate::error::KeyError;

#[derive(Debug, Default)]
pub struct SignerPair {
    l1: Option<EcdsaSigner>,
    l2: Option<EddsaSigner>,
}

impl SignerPair {
    pub fn new(l1: Option<EcdsaSigner>, l2: Option<EddsaSigner>) -> Self {
        Self { l1, l2 }
    }

    /// Parses both keys; either may be `None`.
    pub fn from_hex(l1_key: Option<&str>, l2_key: Option<&str>) -> Result<Self, KeyError> {
        let l1 = l1_key.map(EcdsaSigner::from_hex).transpose()?;
        let l2 = l2_key.map(EddsaSigner::from_hex).transpose()?;
        Ok(Self { l1, l2 })
    }

    pub fn l1(&self) -> Result<&EcdsaSigner, KeyError> {
        self.l1.as_ref().ok_or(KeyError::Missing("L1"))
    }

    pub fn l2(&self) -> Result<&EddsaSigner, KeyError> {
        self.l2.as_ref().ok_or(KeyError::Missing("L2"))
    }

    pub fn has_l1(&self) -> bool {
        self.l1.is_some()
    }

    pub fn has_l2(&self) -> bool {
        self.l2.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::ecdsa::TEST_L1_PRIVATE_KEY;
    use crate::signer::eddsa::TEST_L2_PRIVATE_KEY;

    #[test]
    fn test_missing_layers() {
        let pair = SignerPair::from_hex(None, Some(TEST_L2_PRIVATE_KEY)).unwrap();
        assert!(matches!(pair.l1(), Err(KeyError::Missing("L1"))));
        assert!(pair.l2().is_ok());
        assert!(!pair.has_l1());

        let empty = SignerPair::default();
        assert!(matches!(empty.l2(), Err(KeyError::Missing("L2"))));
    }

    #[test]
    fn test_bad_key_fails_whole_pair() {
        assert!(matches!(
            SignerPair::from_hex(Some(TEST_L1_PRIVATE_KEY), Some("0x0")),
            Err(KeyError::InvalidL2Key(_))
        ));
    }

    #[test]
    fn test_debug_redacts_both_keys() {
        let pair = SignerPair::from_hex(Some(TEST_L1_PRIVATE_KEY), Some(TEST_L2_PRIVATE_KEY)).unwrap();
        let dbg = format!("{:?}", pair);
        assert!(!dbg.contains("4c0883a69102937d"));
        assert!(!dbg.contains("4a3d1e098350"));
    }
}

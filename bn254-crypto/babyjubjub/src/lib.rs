//! # Baby-Jubjub EdDSA
//!
//! The Baby-Jubjub twisted Edwards curve embedded in the BN254 scalar field, and
//! the EdDSA variant whose challenge is a Poseidon hash, as verified by the
//! exchange's zk circuits.
//!
//! - **Curve**: `168700*x^2 + y^2 = 1 + 168696*x^2*y^2` over `Fr`, cofactor 8,
//!   prime subgroup of order `L`.
//! - **Keys**: [`PrivateKey`] scalars with `0 < k < L`, [`PublicKey`] `A = k*B`.
//! - **Signatures**: deterministic nonce `r = SHA-512(k || M) mod L`,
//!   `R = r*B`, `t = Poseidon(R.x, R.y, A.x, A.y, M)`, `s = r + k*t mod #E`.
//!
//! ## Example
//!
//! ```rust
//! use babyjubjub_eddsa::PrivateKey;
//! use poseidon_bn254::Fr;
//!
//! let key = PrivateKey::from_hex("0x5").unwrap();
//! let message = Fr::from_u64(360292934);
//! let signature = key.sign(&message).unwrap();
//! assert!(key.public_key().verify(&message, &signature).unwrap());
//! ```

pub mod curve;
pub mod eddsa;

pub use curve::{curve_order, subgroup_order, Point};
pub use eddsa::{challenge, PrivateKey, PublicKey, Signature};

use poseidon_bn254::PoseidonError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurveError {
    #[error("Point is not on the Baby-Jubjub curve")]
    NotOnCurve,
    #[error("Invalid compressed point encoding")]
    InvalidEncoding,
    #[error("Private key must be non-zero")]
    ZeroKey,
    #[error("Private key must be below the subgroup order")]
    KeyOutOfRange,
    #[error("Invalid private key: {0}")]
    InvalidKey(String),
    #[error("Poseidon error: {0}")]
    Poseidon(#[from] PoseidonError),
}

pub type Result<T> = std::result::Result<T, CurveError>;

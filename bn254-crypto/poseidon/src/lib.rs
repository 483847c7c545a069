//! # Poseidon over BN254
//!
//! Scalar field arithmetic for the BN254 curve and the Poseidon permutation
//! in the variant used by zkSNARK circuits built on ethsnarks-style gadgets.
//!
//! ## Overview
//!
//! - **Field**: [`Fr`], an element of the BN254 scalar field
//!   `p = 21888242871839275222246405745257275088548364400416034343698204186575808495617`
//! - **Parameters**: [`PoseidonParams`], a permutation schedule (state width, full and
//!   partial round counts, seed, S-box exponent) with derived round constants and a
//!   Cauchy MDS matrix. Schedules are checked against the known attack bounds when built.
//! - **Permutation**: [`poseidon`] absorbs up to `t - 1` inputs in a single permutation
//!   and returns lane 0.
//!
//! Round constants and MDS entries are derived from the seed with BLAKE2b-256, read as
//! little-endian integers and reduced modulo `p`, so two implementations that share a
//! seed and schedule produce identical hashes.
//!
//! ## Example
//!
//! ```rust
//! use poseidon_bn254::{poseidon, Fr, PoseidonParams};
//!
//! let params = PoseidonParams::new(2, 6, 53, b"poseidon", 5, Some(128)).unwrap();
//! let digest = poseidon(&[Fr::from_u64(5)], &params).unwrap();
//! assert_eq!(
//!     digest.to_hex(),
//!     "0x24ae3c702dae4fd0428cccab2fdc99e2418a159c64275252ea535f184422c439"
//! );
//! ```

pub mod field;
pub mod params;
pub mod permutation;


pub use field::{modulus, Fr};
pub use params::PoseidonParams;
pub use permutation::{permute, poseidon};

use thiserror::Error;

/// Errors raised by field parsing, parameter construction and hashing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoseidonError {
    /// The integer is not reduced below the field modulus.
    #[error("Value is not a canonical field element (must be below the BN254 scalar modulus)")]
    NonCanonical,
    /// The hex string could not be decoded.
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),
    /// The decimal string could not be parsed.
    #[error("Invalid decimal encoding: {0}")]
    InvalidDecimal(String),
    /// The input is wider than 32 bytes.
    #[error("Value too wide: {0} bytes, maximum is 32")]
    TooWide(usize),
    /// No inputs were supplied to the permutation.
    #[error("Poseidon requires at least one input")]
    EmptyInput,
    /// More inputs than the state can hold (inputs must be fewer than `t`).
    #[error("Too many inputs: {got} inputs for state width {t}")]
    TooManyInputs { got: usize, t: usize },
    /// The permutation schedule violates a structural rule or a security bound.
    #[error("Invalid Poseidon parameters: {0}")]
    InvalidParams(String),
}

/// Result type for field and permutation operations.
pub type Result<T> = std::result::Result<T, PoseidonError>;

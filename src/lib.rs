//! Loopring request signer
//!
//! Produces the two signatures a hybrid L1/L2 exchange request carries:
//! - L1: EIP-712 typed-data digest signed with secp256k1 ECDSA
//! - L2: Poseidon hash over BN254 signed with Baby-Jubjub EdDSA
//!
//! plus the REST `X-API-SIG` URL signature and the signature wire formats.

pub mod canonical;
pub mod codec;
pub mod config;
pub mod domain;
pub mod eip712;
pub mod error;
pub mod pipeline;
pub mod poseidon;
pub mod schema;
pub mod signer;

pub use domain::{Domain, DomainRegistry};
pub use error::{Result, SignerError};
pub use pipeline::{RequestSigner, SignatureMode, SignedMessage, SignedUrl};
pub use schema::MessageType;

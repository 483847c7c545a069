//! Error types using thiserror
//!
//! One enum per concern (schemas, domains, keys, signature encoding,
//! configuration), all wrapped by `SignerError` so callers can use `?`
//! across the whole pipeline.

use babyjubjub_eddsa::CurveError;
use poseidon_bn254::PoseidonError;
use thiserror::Error;

/// Request-to-field-value failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("Message type {message_type} has no {layer} schema")]
    UnsupportedLayer {
        message_type: String,
        layer: &'static str,
    },

    #[error("Field missing: {0}")]
    FieldMissing(String),

    #[error("Value out of range for field '{0}'")]
    ValueOutOfRange(String),

    #[error("Invalid value for field '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Domain not registered: {0}")]
    NotFound(String),

    #[error("Conflicting domain already registered for {0}")]
    Conflict(String),

    #[error("Domain registry is not ready")]
    NotReady,

    #[error("Pool {pool} registered with verifying contract {contract}")]
    ContractMismatch { pool: String, contract: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid L1 private key: {0}")]
    InvalidL1Key(String),

    #[error("Invalid L2 private key: {0}")]
    InvalidL2Key(String),

    #[error("No {0} key configured")]
    Missing(&'static str),

    #[error("ECDSA signing failed: {0}")]
    Signing(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    #[error("Signature component out of range: {0}")]
    ComponentOutOfRange(String),

    #[error("Unknown signature type: {0}")]
    UnknownSignType(String),

    #[error("Signer recovery failed: {0}")]
    Recovery(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    #[error("YAML parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum SignerError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("EdDSA error: {0}")]
    Eddsa(#[from] CurveError),

    #[error("Poseidon error: {0}")]
    Poseidon(#[from] PoseidonError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using SignerError
pub type Result<T> = std::result::Result<T, SignerError>;

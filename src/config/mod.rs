//! Configuration module for the signer
//!
//! This module provides:
//! - Domain configuration types (`SignerConfig`, `ExchangeDomainConfig`, `PoolDomainConfig`)
//! - YAML loading functionality (`load_config`)
//! - Signing keys from the environment (`KeyConfig`)
//! - Constants with environment variable overrides
//! - Logging setup and secret redaction

pub mod constants;
pub mod keys;
mod loader;
pub mod logging;
mod types;

pub use keys::KeyConfig;
pub use loader::{load_config, load_config_from_str};
pub use types::{ExchangeDomainConfig, PoolDomainConfig, SignerConfig};

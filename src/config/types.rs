//! Configuration types for the signer
//!
//! The YAML file describes the EIP-712 domains the signer hashes under: one
//! exchange domain and any number of AMM pool domains. Keys are not part of
//! the file; see `KeyConfig`.

use std::collections::HashSet;

use ethers::types::Address;
use serde::{Deserialize, Serialize};

use super::constants;
use crate::canonical::address_from_str;
use crate::codec::EthSignType;
use crate::domain::{Domain, DomainRegistry};
use crate::error::{ConfigError, SignerError};

// ============================================================================
// Configuration Structs
// ============================================================================

/// Exchange (or default) EIP-712 domain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExchangeDomainConfig {
    #[serde(default = "constants::exchange_domain_name")]
    pub name: String,
    #[serde(default = "constants::exchange_domain_version")]
    pub version: String,
    #[serde(default = "constants::default_chain_id")]
    pub chain_id: u64,
    /// Exchange contract address
    pub verifying_contract: String,
}

impl ExchangeDomainConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("exchange: name cannot be empty".to_string()));
        }
        if self.version.trim().is_empty() {
            return Err(ConfigError::Invalid("exchange: version cannot be empty".to_string()));
        }
        parse_address("exchange.verifying_contract", &self.verifying_contract)?;
        Ok(())
    }

    pub fn to_domain(&self) -> Result<Domain, ConfigError> {
        Ok(Domain::new(
            self.name.clone(),
            self.version.clone(),
            self.chain_id,
            parse_address("exchange.verifying_contract", &self.verifying_contract)?,
        ))
    }
}

/// One AMM pool domain. The pool contract is its own verifying contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PoolDomainConfig {
    /// Pool contract address
    pub address: String,
    /// Domain name, e.g. "AMM Pool LRC-ETH"
    pub name: String,
    #[serde(default = "constants::pool_domain_version")]
    pub version: String,
    /// Defaults to the exchange domain's chain id
    #[serde(default)]
    pub chain_id: Option<u64>,
}

impl PoolDomainConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "Pool '{}': name cannot be empty",
                self.address
            )));
        }
        if self.version.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "Pool '{}': version cannot be empty",
                self.address
            )));
        }
        parse_address("pools.address", &self.address)?;
        Ok(())
    }

    pub fn to_domain(&self, default_chain_id: u64) -> Result<(Address, Domain), ConfigError> {
        let address = parse_address("pools.address", &self.address)?;
        let domain = Domain::new(
            self.name.clone(),
            self.version.clone(),
            self.chain_id.unwrap_or(default_chain_id),
            address,
        );
        Ok((address, domain))
    }
}

fn default_sign_type() -> String {
    EthSignType::Eip712.as_str().to_string()
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignerConfig {
    pub exchange: ExchangeDomainConfig,
    #[serde(default)]
    pub pools: Vec<PoolDomainConfig>,
    /// Host prefix for signed REST URLs
    #[serde(default = "constants::rest_host")]
    pub rest_host: String,
    /// `EIP_712` or `ETH_SIGN`
    #[serde(default = "default_sign_type")]
    pub l1_sign_type: String,
}

impl SignerConfig {
    /// Validate all configuration rules
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.exchange.validate()?;

        let mut seen = HashSet::new();
        for pool in &self.pools {
            pool.validate()?;
            let address = parse_address("pools.address", &pool.address)?;
            // rule: one domain per pool
            if !seen.insert(address) {
                return Err(ConfigError::Invalid(format!(
                    "Duplicate pool address: {}",
                    pool.address
                )));
            }
        }

        if !self.rest_host.starts_with("http://") && !self.rest_host.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "rest_host must start with http:// or https:// (got '{}')",
                self.rest_host
            )));
        }

        self.sign_type()?;
        Ok(())
    }

    pub fn sign_type(&self) -> Result<EthSignType, ConfigError> {
        match self.l1_sign_type.parse::<EthSignType>() {
            Ok(t @ (EthSignType::Eip712 | EthSignType::EthSign)) => Ok(t),
            _ => Err(ConfigError::Invalid(format!(
                "l1_sign_type must be EIP_712 or ETH_SIGN (got '{}')",
                self.l1_sign_type
            ))),
        }
    }

    /// Registers every configured domain and opens the registry for lookups.
    pub fn build_registry(&self) -> Result<DomainRegistry, SignerError> {
        let registry = DomainRegistry::new();
        registry.register_exchange_domain(self.exchange.to_domain()?)?;
        for pool in &self.pools {
            let (address, domain) = pool.to_domain(self.exchange.chain_id)?;
            registry.register_pool_domain(address, domain)?;
        }
        registry.mark_ready();
        Ok(registry)
    }
}

fn parse_address(field: &str, value: &str) -> Result<Address, ConfigError> {
    address_from_str(field, value).map_err(|e| ConfigError::Invalid(format!("{}: {}", field, e)))
}

//! EIP-712 domains
//!
//! One exchange domain plus one domain per AMM pool, keyed by pool address.
//! Registration is append-only: re-registering an identical domain is a
//! no-op, a different domain for a taken key is a conflict. Writers are
//! serialized behind a mutex; readers load an immutable snapshot and never
//! block. Lookups fail with `NotReady` until `mark_ready` is called, so a
//! signer cannot race the loader that populates the pools.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use arc_swap::ArcSwap;
use ethers::abi::{encode, Token};
use ethers::core::utils::keccak256;
use ethers::types::{Address, H256, U256};
use serde::Serialize;

use crate::error::DomainError;

pub const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Domain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl Domain {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: u64,
        verifying_contract: Address,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id,
            verifying_contract,
        }
    }

    /// `keccak256(abi.encode(typeHash, keccak(name), keccak(version), chainId, verifyingContract))`
    pub fn separator(&self) -> H256 {
        let encoded = encode(&[
            Token::FixedBytes(keccak256(DOMAIN_TYPE).to_vec()),
            Token::FixedBytes(keccak256(self.name.as_bytes()).to_vec()),
            Token::FixedBytes(keccak256(self.version.as_bytes()).to_vec()),
            Token::Uint(U256::from(self.chain_id)),
            Token::Address(self.verifying_contract),
        ]);
        H256::from(keccak256(encoded))
    }
}

#[derive(Debug)]
struct DomainEntry {
    domain: Domain,
    separator: H256,
}

impl DomainEntry {
    fn new(domain: Domain) -> Self {
        let separator = domain.separator();
        Self { domain, separator }
    }
}

type PoolMap = HashMap<Address, Arc<DomainEntry>>;

pub struct DomainRegistry {
    exchange: OnceLock<DomainEntry>,
    pools: ArcSwap<PoolMap>,
    write_lock: Mutex<()>,
    ready: AtomicBool,
}

impl Default for DomainRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainRegistry {
    pub fn new() -> Self {
        Self {
            exchange: OnceLock::new(),
            pools: ArcSwap::from_pointee(HashMap::new()),
            write_lock: Mutex::new(()),
            ready: AtomicBool::new(false),
        }
    }

    #[tracing::instrument(skip(self, domain), fields(name = %domain.name, chain_id = domain.chain_id))]
    pub fn register_exchange_domain(&self, domain: Domain) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = self.exchange.get() {
            if existing.domain == domain {
                return Ok(());
            }
            tracing::warn!("Rejected conflicting exchange domain");
            return Err(DomainError::Conflict("exchange".to_string()));
        }
        let entry = DomainEntry::new(domain);
        tracing::debug!(separator = ?entry.separator, "Registered exchange domain");
        // cannot fail: checked empty under the write lock
        let _ = self.exchange.set(entry);
        Ok(())
    }

    /// A pool is its own verifying contract; `domain` must name `pool`.
    #[tracing::instrument(skip(self, domain), fields(name = %domain.name))]
    pub fn register_pool_domain(&self, pool: Address, domain: Domain) -> Result<(), DomainError> {
        if domain.verifying_contract != pool {
            tracing::warn!(contract = ?domain.verifying_contract, "Rejected pool domain for another contract");
            return Err(DomainError::ContractMismatch {
                pool: format!("{:?}", pool),
                contract: format!("{:?}", domain.verifying_contract),
            });
        }
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let current = self.pools.load();
        if let Some(existing) = current.get(&pool) {
            if existing.domain == domain {
                return Ok(());
            }
            tracing::warn!("Rejected conflicting pool domain");
            return Err(DomainError::Conflict(format!("{:?}", pool)));
        }
        let mut next: PoolMap = (**current).clone();
        let entry = Arc::new(DomainEntry::new(domain));
        tracing::debug!(separator = ?entry.separator, "Registered pool domain");
        next.insert(pool, entry);
        self.pools.store(Arc::new(next));
        Ok(())
    }

    /// Opens the registry for lookups.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
        tracing::info!(pools = self.pools.load().len(), "Domain registry ready");
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn check_ready(&self) -> Result<(), DomainError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(DomainError::NotReady)
        }
    }

    /// Separator of the exchange domain (`pool = None`) or of a pool domain.
    pub fn domain_hash(&self, pool: Option<&Address>) -> Result<H256, DomainError> {
        self.check_ready()?;
        match pool {
            None => self
                .exchange
                .get()
                .map(|e| e.separator)
                .ok_or_else(|| DomainError::NotFound("exchange".to_string())),
            Some(addr) => self
                .pools
                .load()
                .get(addr)
                .map(|e| e.separator)
                .ok_or_else(|| DomainError::NotFound(format!("{:?}", addr))),
        }
    }

    pub fn domain(&self, pool: Option<&Address>) -> Result<Domain, DomainError> {
        self.check_ready()?;
        match pool {
            None => self
                .exchange
                .get()
                .map(|e| e.domain.clone())
                .ok_or_else(|| DomainError::NotFound("exchange".to_string())),
            Some(addr) => self
                .pools
                .load()
                .get(addr)
                .map(|e| e.domain.clone())
                .ok_or_else(|| DomainError::NotFound(format!("{:?}", addr))),
        }
    }

    pub fn pool_count(&self) -> usize {
        self.pools.load().len()
    }
}

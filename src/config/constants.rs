//! Signer-wide constants and configuration defaults
//!
//! Values used when the YAML configuration leaves a field out. Each can be
//! overridden via an environment variable.

// =============================================================================
// REST
// =============================================================================

/// REST host used when building signed request URLs (default: `https://api3.loopring.io`)
///
/// Environment variable: `LOOPRING_REST_HOST`
pub fn rest_host() -> String {
    std::env::var("LOOPRING_REST_HOST")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "https://api3.loopring.io".to_string())
}

// =============================================================================
// EIP-712 Domains
// =============================================================================

/// Exchange domain name (default: `Loopring Protocol`)
///
/// Environment variable: `EXCHANGE_DOMAIN_NAME`
pub fn exchange_domain_name() -> String {
    std::env::var("EXCHANGE_DOMAIN_NAME")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "Loopring Protocol".to_string())
}

/// Exchange domain version (default: `3.6.0`)
///
/// Environment variable: `EXCHANGE_DOMAIN_VERSION`
pub fn exchange_domain_version() -> String {
    std::env::var("EXCHANGE_DOMAIN_VERSION")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "3.6.0".to_string())
}

/// AMM pool domain version (default: `1.0.0`)
///
/// Environment variable: `POOL_DOMAIN_VERSION`
pub fn pool_domain_version() -> String {
    std::env::var("POOL_DOMAIN_VERSION")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "1.0.0".to_string())
}

/// Chain id used when the configuration omits one (default: 1, mainnet)
///
/// Environment variable: `CHAIN_ID`
pub fn default_chain_id() -> u64 {
    std::env::var("CHAIN_ID")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Print all configuration values (for debugging/startup logs)
pub fn log_configuration() {
    tracing::info!("=== Signer Configuration ===");
    tracing::info!("REST:");
    tracing::info!("  - Host: {}", rest_host());
    tracing::info!("Domains:");
    tracing::info!("  - Exchange: {} v{}", exchange_domain_name(), exchange_domain_version());
    tracing::info!("  - Pool version: {}", pool_domain_version());
    tracing::info!("  - Default chain id: {}", default_chain_id());
    tracing::info!("============================");
}

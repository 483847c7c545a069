//! Configuration loader for YAML files
//!
//! This module handles loading and validating configuration from YAML files.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::ConfigError;

use super::types::SignerConfig;

/// Load configuration from a YAML file
///
/// This function:
/// 1. Checks if the file exists
/// 2. Parses the YAML content
/// 3. Validates the configuration rules
///
/// # Example
/// ```ignore
/// use std::path::Path;
/// use loopring_signer::config::load_config;
///
/// let config = load_config(Path::new("config/signer.yaml"))?;
/// let registry = config.build_registry()?;
/// ```
pub fn load_config(path: &Path) -> Result<SignerConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let config: SignerConfig = serde_yaml::from_reader(reader)
        .map_err(|e| ConfigError::Parse(format!("'{}': {}", path.display(), e)))?;

    config.validate()?;

    tracing::info!(
        path = %path.display(),
        pools = config.pools.len(),
        chain_id = config.exchange.chain_id,
        "Loaded signer configuration"
    );
    Ok(config)
}

/// Load configuration from a YAML string (useful for testing)
pub fn load_config_from_str(yaml_content: &str) -> Result<SignerConfig, ConfigError> {
    let config: SignerConfig =
        serde_yaml::from_str(yaml_content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    config.validate()?;

    Ok(config)
}

// ============================================================================
// Tests
// ============================================================================

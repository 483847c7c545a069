//! Loopring signer entry point
//!
//! Reads one JSON request from stdin, signs it and prints the signed message
//! as JSON on stdout:
//!
//! ```text
//! {"type": "Transfer", "request": {...}, "mode": "both"}
//! ```
//!
//! `mode` is optional (`l1`, `l2` or `both`); without it the message type's
//! default layers are signed. A `{"url": {...}}` body signs a REST request
//! instead. Domains come from `CONFIG_PATH` (default `config.yaml`), keys from
//! `L1_PRIVATE_KEY` / `L2_PRIVATE_KEY`.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use loopring_signer::config::{self, constants, logging, KeyConfig};
use loopring_signer::{MessageType, RequestSigner, SignatureMode};

#[derive(Debug, Deserialize)]
struct UrlInput {
    #[serde(default = "default_method")]
    method: String,
    path: String,
    #[serde(default)]
    params: Vec<(String, String)>,
}

fn default_method() -> String {
    "GET".to_string()
}

#[derive(Debug, Deserialize)]
struct SignInput {
    #[serde(rename = "type")]
    message_type: Option<String>,
    #[serde(default)]
    request: Value,
    mode: Option<String>,
    url: Option<UrlInput>,
}

fn parse_mode(mode: Option<&str>, message_type: MessageType) -> anyhow::Result<SignatureMode> {
    Ok(match mode.map(str::to_ascii_lowercase).as_deref() {
        None => SignatureMode::default_for(message_type),
        Some("l1") => SignatureMode::L1Only,
        Some("l2") => SignatureMode::L2Only,
        Some("both") => SignatureMode::Both,
        Some(other) => bail!("unknown mode '{}' (expected l1, l2 or both)", other),
    })
}

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenvy::dotenv().ok();

    logging::init_logging();
    constants::log_configuration();

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
    let config = match config::load_config(Path::new(&config_path)) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(path = %config_path, error = %e, "Configuration failed");
            return Err(e.into());
        }
    };

    let registry = Arc::new(config.build_registry()?);
    let keys = KeyConfig::from_env()?;
    let signer = RequestSigner::new(registry, keys.signer_pair()?)
        .with_l1_sign_type(config.sign_type()?);

    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("reading request from stdin")?;
    let input: SignInput = serde_json::from_str(&raw).context("parsing request JSON")?;

    let output = if let Some(url) = input.url {
        let signed = signer.sign_url(&url.method, &config.rest_host, &url.path, &url.params)?;
        info!(path = %url.path, "Signed URL");
        serde_json::to_string_pretty(&signed)?
    } else {
        let Some(type_name) = input.message_type else {
            bail!("request JSON needs either \"type\" or \"url\"");
        };
        let message_type: MessageType = type_name.parse()?;
        let mode = parse_mode(input.mode.as_deref(), message_type)?;
        let signed = signer.sign_request(message_type, &input.request, mode)?;
        serde_json::to_string_pretty(&signed)?
    };

    println!("{}", output);
    Ok(())
}

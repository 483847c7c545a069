//! Prints the EIP-712 domain separator for a pool or exchange domain.
//!
//! Usage: domain_separator <name> <version> <chain_id> <verifying_contract>

use anyhow::{bail, Context};

use loopring_signer::canonical::address_from_str;
use loopring_signer::Domain;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let [name, version, chain_id, contract] = args.as_slice() else {
        bail!("usage: domain_separator <name> <version> <chain_id> <verifying_contract>");
    };

    let chain_id: u64 = chain_id
        .parse()
        .with_context(|| format!("invalid chain id '{}'", chain_id))?;
    let contract = address_from_str("verifying_contract", contract)?;

    let domain = Domain::new(name.clone(), version.clone(), chain_id, contract);
    println!("{:?}", domain.separator());
    Ok(())
}

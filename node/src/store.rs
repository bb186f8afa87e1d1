//! File persistence for the ledger deployment and receipts.
//!
//! Both are plain JSON. Ledger writes go through a temporary file and a
//! rename so an interrupted command never leaves a half-written ledger.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

use tandem_contracts::state_channel::StateChannel;
use tandem_contracts::token::Erc20Token;
use tandem_protocol::channel::ChannelReceipt;

/// A token ledger with the settlement contract deployed on it.
pub type Deployment = StateChannel<Erc20Token>;

/// Load the deployment at `path`.
pub fn load_deployment(path: &Path) -> Result<Deployment> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read ledger {} (run `init` first?)", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("ledger {} is not a valid deployment", path.display()))
}

/// Persist `deployment` to `path`, replacing any previous file.
pub fn save_deployment(path: &Path, deployment: &Deployment) -> Result<()> {
    let json = serde_json::to_string_pretty(deployment).context("failed to encode ledger")?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)
        .with_context(|| format!("failed to write ledger to {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to move ledger into place at {}", path.display()))?;

    tracing::debug!(path = %path.display(), "ledger saved");
    Ok(())
}

/// Load a receipt at any signing stage.
pub fn load_receipt(path: &Path) -> Result<ChannelReceipt> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read receipt {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid receipt", path.display()))
}

/// Write a receipt to `out`, or to stdout when `out` is `None`.
pub fn write_receipt(out: Option<&Path>, receipt: &ChannelReceipt) -> Result<()> {
    let json = serde_json::to_string_pretty(receipt).context("failed to encode receipt")?;
    match out {
        Some(path) => {
            fs::write(path, format!("{json}\n"))
                .with_context(|| format!("failed to write receipt to {}", path.display()))?;
            tracing::info!(path = %path.display(), nonce = receipt.nonce(), "receipt written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").context("failed to write receipt to stdout")?;
        }
    }
    Ok(())
}

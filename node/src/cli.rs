//! # CLI Interface
//!
//! Defines the command-line argument structure for `tandem-node` using
//! `clap` derive. Every command works on local files: the ledger deployment
//! is one JSON file, receipts are JSON files passed between participants.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use tandem_protocol::config::DEFAULT_INITIAL_SUPPLY;
use tandem_protocol::crypto::Address;

/// Tandem channel operator tool.
///
/// Deploys a token ledger, builds and counter-signs channel receipts, and
/// settles the final receipt back onto the ledger.
#[derive(Parser, Debug)]
#[command(
    name = "tandem-node",
    about = "Tandem two-party token channel tool",
    version,
    propagate_version = true
)]
pub struct TandemCli {
    /// Path to the ledger deployment file.
    #[arg(long, global = true, env = "TANDEM_LEDGER", default_value = "tandem-ledger.json")]
    pub ledger: PathBuf,

    /// Log filter directives, e.g. `tandem_protocol=debug`.
    #[arg(
        long,
        global = true,
        env = "TANDEM_LOG",
        default_value = "tandem_node=info,tandem_protocol=info,tandem_contracts=info"
    )]
    pub log: String,

    /// Log output format: `pretty` or `json`.
    #[arg(long, global = true, env = "TANDEM_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the Tandem binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy a fresh token ledger with the whole supply held by `--owner`.
    Init(InitArgs),
    /// Generate a new participant key and print it with its address.
    Keygen,
    /// Plain ledger transfer, used to fund participants before opening.
    TokenTransfer(TokenTransferArgs),
    /// Build the opening receipt of a channel.
    Open(OpenArgs),
    /// Build the next receipt on top of an authorized one.
    Pay(PayArgs),
    /// Counter-sign a receipt.
    Approve(ApproveArgs),
    /// Show a receipt's balances, signing state, and recovered signers.
    Inspect(InspectArgs),
    /// Submit an authorized receipt to the settlement contract.
    Settle(SettleArgs),
    /// Print a ledger balance.
    Balance(BalanceArgs),
    /// Print version information and exit.
    Version,
}

/// The participant key, shared by every signing command.
#[derive(Args, Debug)]
pub struct KeyArgs {
    /// Hex-encoded secp256k1 private key.
    ///
    /// Prefer the environment variable over the flag so the key stays out
    /// of shell history.
    #[arg(long, env = "TANDEM_KEY", hide_env_values = true)]
    pub key: String,
}

/// Arguments for the `init` subcommand.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Account that receives the initial supply.
    #[arg(long)]
    pub owner: Address,

    /// Tokens minted at deployment.
    #[arg(long, env = "INITIAL_SUPPLY", default_value_t = DEFAULT_INITIAL_SUPPLY)]
    pub initial_supply: u128,

    /// Overwrite an existing ledger file.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `token-transfer` subcommand.
#[derive(Args, Debug)]
pub struct TokenTransferArgs {
    #[command(flatten)]
    pub key: KeyArgs,

    /// Receiving account.
    #[arg(long)]
    pub to: Address,

    /// Tokens to move.
    #[arg(long)]
    pub amount: u128,
}

/// Arguments for the `open` subcommand.
#[derive(Args, Debug)]
pub struct OpenArgs {
    #[command(flatten)]
    pub key: KeyArgs,

    /// Counterparty address.
    #[arg(long)]
    pub to: Address,

    /// Tokens to pay the counterparty.
    #[arg(long)]
    pub value: u128,

    /// Sender's balance before this payment.
    #[arg(long)]
    pub sender_balance: u128,

    /// Counterparty's balance before this payment.
    #[arg(long, default_value_t = 0)]
    pub target_balance: u128,

    /// Write the receipt here instead of stdout.
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

/// Arguments for the `pay` subcommand.
#[derive(Args, Debug)]
pub struct PayArgs {
    #[command(flatten)]
    pub key: KeyArgs,

    /// Other participant's address.
    #[arg(long)]
    pub to: Address,

    /// Tokens to pay.
    #[arg(long)]
    pub value: u128,

    /// The latest authorized receipt of the channel.
    #[arg(long)]
    pub prior: PathBuf,

    /// Write the receipt here instead of stdout.
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

/// Arguments for the `approve` subcommand.
#[derive(Args, Debug)]
pub struct ApproveArgs {
    #[command(flatten)]
    pub key: KeyArgs,

    /// Receipt to counter-sign.
    pub receipt: PathBuf,

    /// Write the approved receipt here instead of stdout.
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Receipt to inspect.
    pub receipt: PathBuf,
}

/// Arguments for the `settle` subcommand.
#[derive(Args, Debug)]
pub struct SettleArgs {
    #[command(flatten)]
    pub key: KeyArgs,

    /// Authorized receipt to settle.
    pub receipt: PathBuf,
}

/// Arguments for the `balance` subcommand.
#[derive(Args, Debug)]
pub struct BalanceArgs {
    /// Account to query.
    pub address: Address,
}

// Copyright (c) 2026 Tandem Contributors. MIT License.
// See LICENSE for details.

//! # Tandem Node
//!
//! Entry point for the `tandem-node` binary. Parses CLI arguments,
//! initializes logging, and runs one command against local files.
//!
//! A typical channel, end to end:
//!
//! ```text
//! tandem-node init --owner $OWNER
//! tandem-node token-transfer --to $ALICE --amount 100000        # owner key
//! tandem-node open --to $BOB --value 80000 --sender-balance 100000 -o r0.json
//! tandem-node approve r0.json -o r0.json                         # bob's key
//! tandem-node pay --to $ALICE --value 35000 --prior r0.json -o r1.json
//! tandem-node approve r1.json -o r1.json                         # alice's key
//! tandem-node settle r1.json
//! ```

mod cli;
mod logging;
mod store;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::Path;

use tandem_contracts::token::Erc20Token;
use tandem_protocol::channel::{approve_as, ChannelReceipt, ReceiptBuilder, Role};
use tandem_protocol::crypto::ChannelKeypair;

use cli::{Commands, KeyArgs, TandemCli};
use logging::LogFormat;
use store::Deployment;

fn main() -> Result<()> {
    let cli = TandemCli::parse();
    logging::init_logging(&cli.log, LogFormat::from_str_lossy(&cli.log_format));

    let ledger = cli.ledger.as_path();
    match cli.command {
        Commands::Init(args) => init_ledger(ledger, args),
        Commands::Keygen => {
            generate_key();
            Ok(())
        }
        Commands::TokenTransfer(args) => token_transfer(ledger, args),
        Commands::Open(args) => open_channel(args),
        Commands::Pay(args) => pay(args),
        Commands::Approve(args) => approve_receipt(args),
        Commands::Inspect(args) => inspect(args),
        Commands::Settle(args) => settle(ledger, args),
        Commands::Balance(args) => balance(ledger, args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

fn load_key(args: &KeyArgs) -> Result<ChannelKeypair> {
    ChannelKeypair::from_hex(&args.key).context("invalid participant key (--key / TANDEM_KEY)")
}

/// Deploys the token and the settlement contract to a new ledger file.
fn init_ledger(path: &Path, args: cli::InitArgs) -> Result<()> {
    if path.exists() && !args.force {
        bail!(
            "ledger {} already exists; pass --force to replace it",
            path.display()
        );
    }

    let deployment = Deployment::new(Erc20Token::deploy(args.owner, args.initial_supply));
    store::save_deployment(path, &deployment)?;
    tracing::info!(path = %path.display(), owner = %args.owner, "ledger initialized");

    println!("Ledger initialized successfully.");
    println!("  Ledger file    : {}", path.display());
    println!("  Owner          : {}", args.owner);
    println!("  Initial supply : {}", args.initial_supply);
    Ok(())
}

fn generate_key() {
    let keypair = ChannelKeypair::generate();
    println!("Private key : 0x{}", hex::encode(keypair.secret_key_bytes()));
    println!("Address     : {}", keypair.address());
}

fn token_transfer(path: &Path, args: cli::TokenTransferArgs) -> Result<()> {
    let keypair = load_key(&args.key)?;
    let mut deployment = store::load_deployment(path)?;

    deployment
        .ledger_mut()
        .transfer(&keypair.address(), &args.to, args.amount)
        .context("token transfer failed")?;
    store::save_deployment(path, &deployment)?;

    let token = deployment.ledger();
    println!("{} -> {} : {}", keypair.address(), args.to, args.amount);
    println!("  {} : {}", keypair.address(), token.balance_of(&keypair.address()));
    println!("  {} : {}", args.to, token.balance_of(&args.to));
    Ok(())
}

fn open_channel(args: cli::OpenArgs) -> Result<()> {
    let keypair = load_key(&args.key)?;
    let receipt = ReceiptBuilder::transfer(args.value, args.to)
        .opening(args.sender_balance, args.target_balance)
        .sign(&keypair)
        .context("failed to build opening receipt")?;
    store::write_receipt(args.out.as_deref(), &receipt)
}

fn pay(args: cli::PayArgs) -> Result<()> {
    let keypair = load_key(&args.key)?;
    let prior = store::load_receipt(&args.prior)?;
    let receipt = ReceiptBuilder::transfer(args.value, args.to)
        .after(&prior)
        .sign(&keypair)
        .with_context(|| format!("failed to extend {}", args.prior.display()))?;
    store::write_receipt(args.out.as_deref(), &receipt)
}

fn approve_receipt(args: cli::ApproveArgs) -> Result<()> {
    let keypair = load_key(&args.key)?;
    let receipt = store::load_receipt(&args.receipt)?;
    let approved = approve_as(&receipt, &keypair)
        .with_context(|| format!("failed to approve {}", args.receipt.display()))?;
    store::write_receipt(args.out.as_deref(), &approved)
}

fn inspect(args: cli::InspectArgs) -> Result<()> {
    let receipt = store::load_receipt(&args.receipt)?;
    print_receipt(&receipt);
    Ok(())
}

fn print_receipt(receipt: &ChannelReceipt) {
    let body = receipt.body();
    let message = body.message();

    println!("Nonce        : {}", body.nonce);
    println!("State        : {}", receipt.state());
    println!(
        "Transfer     : {} -> {} : {}",
        body.transfer.from, body.transfer.to, body.transfer.value
    );
    println!("Message      : {}", message);

    for role in [Role::Initiator, Role::Counterparty] {
        let participant = body.participant(role);
        let verdict = match receipt.signature(role) {
            None => "unsigned".to_string(),
            Some(sig) if sig.is_valid_for(&message, &participant) => "valid".to_string(),
            Some(sig) => match sig.signer() {
                Ok(signer) => format!("INVALID (recovers to {signer})"),
                Err(err) => format!("INVALID ({err})"),
            },
        };
        println!(
            "{role} : {participant} balance={} signature={verdict}",
            body.balance(role)
        );
    }
}

/// Settles an authorized receipt as the key holder.
fn settle(path: &Path, args: cli::SettleArgs) -> Result<()> {
    let keypair = load_key(&args.key)?;
    let mut deployment = store::load_deployment(path)?;
    let receipt = store::load_receipt(&args.receipt)?
        .authorized()
        .with_context(|| format!("{} cannot be settled", args.receipt.display()))?;

    deployment
        .settle(&receipt, &keypair.address())
        .context("settlement rejected")?;
    store::save_deployment(path, &deployment)?;

    let body = receipt.body();
    let token = deployment.ledger();
    println!("Settled receipt at nonce {}.", body.nonce);
    println!("  {} : {}", body.participant1, token.balance_of(&body.participant1));
    println!("  {} : {}", body.participant2, token.balance_of(&body.participant2));
    Ok(())
}

fn balance(path: &Path, args: cli::BalanceArgs) -> Result<()> {
    let deployment = store::load_deployment(path)?;
    println!("{}", deployment.ledger().balance_of(&args.address));
    Ok(())
}

fn print_version() {
    println!("tandem-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol    {}", tandem_protocol::config::PROTOCOL_VERSION);
    println!("signing     {}", tandem_protocol::config::SIGNING_ALGORITHM);
    println!("hash        {}", tandem_protocol::config::HASH_FUNCTION);
}

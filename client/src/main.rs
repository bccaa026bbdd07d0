//! Duopool swap client
//!
//! Swaps the base asset for the native coin (or back) against the pool of
//! the configured base asset.

mod config;
mod request;
mod tx_builder;

use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use duopool_core::PoolAddresses;
use request::{RawRequest, RequestError, SwapArgs, SwapRequest};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::signature::{Keypair, Signer};
use std::path::PathBuf;
use std::process::ExitCode;

/// Swap against a duopool liquidity pool
#[derive(Parser, Debug)]
#[command(name = "duopool-swap", version, about, long_about = None)]
struct Cli {
    /// Asset to sell: `base` or `native`
    asset: String,

    /// Amount to sell, as a decimal number of whole units
    #[arg(allow_hyphen_values = true)]
    amount: String,

    /// Account receiving the other asset
    destination: String,

    /// Base asset account to sell from (defaults to `base_account` in the config)
    #[arg(long)]
    source: Option<String>,

    /// Minimum output to accept, as a decimal number of whole units
    #[arg(long = "min-out", allow_hyphen_values = true)]
    min_out: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "DUOPOOL_CONFIG", default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Write the default configuration to `--config` if it does not exist
    #[arg(long)]
    write_config: bool,

    /// Print the resolved accounts and instruction without submitting
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<RequestError>() {
            Some(request_error) => {
                log::error!("{}", request_error);
                ExitCode::from(request_error.exit_code())
            }
            None => {
                log::error!("{:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    if cli.write_config && !cli.config.exists() {
        Config::write_default(&cli.config)?;
    }
    let config = Config::load_or_default(&cli.config)?;

    let program_id = config.program_id()?;
    let base_asset = config.base_asset()?;
    let args = swap_args(&cli, &config)?;

    let payer = load_keypair(&config.keypair_path)?;
    log::info!("Payer wallet: {}", payer.pubkey());
    let request = args.for_payer(&payer.pubkey());

    let addrs = PoolAddresses::derive(&program_id, &base_asset);
    log::info!("Pool state: {}", addrs.pool_state);
    log::debug!(
        "Authority {}, reserve0 {}, reserve1 {}, share mint {}",
        addrs.authority,
        addrs.reserve0,
        addrs.reserve1,
        addrs.share_mint
    );

    if cli.dry_run {
        let ix = tx_builder::build_swap_instruction(&program_id, &base_asset, &payer.pubkey(), &request);
        println!("{:#?}", addrs);
        println!("{:#?}", request);
        println!("{:#?}", ix);
        return Ok(());
    }

    let client = RpcClient::new_with_commitment(config.rpc_url.clone(), config.commitment_config()?);
    log::info!("Connected to RPC: {}", config.rpc_url);

    let signature = submit_swap(&client, &program_id, &base_asset, &payer, &request).await?;
    log::info!(
        "Swapped {} {:?} units, signature {}",
        request.amount_in,
        request.input,
        signature
    );
    Ok(())
}

/// Validate the command line against `config`
fn swap_args(cli: &Cli, config: &Config) -> Result<SwapArgs> {
    let raw = RawRequest {
        asset: &cli.asset,
        amount: &cli.amount,
        destination: &cli.destination,
        source: cli.source.as_deref(),
        min_out: cli.min_out.as_deref(),
    };
    Ok(SwapArgs::parse(&raw, config.decimals, config.base_account()?)?)
}

/// Sign and submit the swap, waiting for the configured commitment
async fn submit_swap(
    client: &RpcClient,
    program_id: &solana_sdk::pubkey::Pubkey,
    base_asset: &solana_sdk::pubkey::Pubkey,
    payer: &Keypair,
    request: &SwapRequest,
) -> Result<String> {
    let blockhash = client
        .get_latest_blockhash()
        .await
        .context("Failed to fetch recent blockhash")?;

    let tx = tx_builder::build_swap_transaction(program_id, base_asset, payer, request, blockhash);

    let signature = client
        .send_and_confirm_transaction(&tx)
        .await
        .context("Swap transaction failed")?;

    Ok(signature.to_string())
}

/// Load payer keypair from file
fn load_keypair(path: &str) -> Result<Keypair> {
    let expanded_path = shellexpand::tilde(path);
    let bytes = std::fs::read(expanded_path.as_ref())
        .context(format!("Failed to read keypair from {}", path))?;

    let keypair = if bytes.first() == Some(&b'[') {
        // JSON format
        let json_data: Vec<u8> =
            serde_json::from_slice(&bytes).context("Failed to parse keypair JSON")?;
        Keypair::try_from(&json_data[..]).context("Failed to create keypair from bytes")?
    } else {
        // Binary format
        Keypair::try_from(&bytes[..]).context("Failed to create keypair from bytes")?
    };

    Ok(keypair)
}

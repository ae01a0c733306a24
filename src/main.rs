use anyhow::{bail, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use opbridge::chain::{await_confirmation, query_bridge_config, query_coin_info, LcdClient};
use opbridge::config::Config;

// Constants for validation
const MAX_WAIT_SECS: u64 = 3600; // 1 hour

#[derive(Parser)]
#[command(name = "opbridge")]
#[command(about = "Bridge client for Move-VM optimistic rollups", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a default configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "config.toml")]
        output: String,
    },

    /// Fetch the bridge configuration from the L1 output contract
    BridgeConfig {
        /// Configuration file path
        #[arg(short, long, default_value = "config.toml")]
        config: String,
    },

    /// Fetch coin metadata for a Move asset type on the rollup
    CoinInfo {
        /// Fully qualified struct tag (e.g. "0x1::native_uinit::Coin")
        struct_tag: String,

        /// Raw L2 token identifier, hex encoded
        l2_token: String,

        /// Configuration file path
        #[arg(short, long, default_value = "config.toml")]
        config: String,
    },

    /// Wait for a broadcast transaction to be confirmed on the rollup
    WaitTx {
        /// Transaction hash to wait for
        tx_hash: String,

        /// Wall-clock timeout in seconds
        #[arg(long, default_value = "60")]
        timeout: u64,

        /// Configuration file path
        #[arg(short, long, default_value = "config.toml")]
        config: String,
    },

    /// Broadcast a pre-signed transaction and wait for confirmation
    Broadcast {
        /// Path to a file holding the signed transaction, base64 encoded
        tx_file: String,

        /// Return immediately after a successful broadcast
        #[arg(long)]
        no_wait: bool,

        /// Configuration file path
        #[arg(short, long, default_value = "config.toml")]
        config: String,
    },

    /// Show node info and latest heights for both layers
    Status {
        /// Configuration file path
        #[arg(short, long, default_value = "config.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "opbridge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { output } => {
            let config = Config::default();
            config.save(&output)?;
            info!("Configuration file created at: {}", output);
        }
        Commands::BridgeConfig { config } => {
            run_bridge_config(&config).await?;
        }
        Commands::CoinInfo { struct_tag, l2_token, config } => {
            run_coin_info(&config, &struct_tag, &l2_token).await?;
        }
        Commands::WaitTx { tx_hash, timeout, config } => {
            run_wait_tx(&config, &tx_hash, timeout).await?;
        }
        Commands::Broadcast { tx_file, no_wait, config } => {
            run_broadcast(&config, &tx_file, no_wait).await?;
        }
        Commands::Status { config } => {
            run_status(&config).await?;
        }
    }

    Ok(())
}

async fn run_bridge_config(config_path: &str) -> Result<()> {
    let config = Config::load(config_path)?;
    let client = LcdClient::new(config.l1_client_config())?;

    let bridge_config = query_bridge_config(&client, &config.bridge.bridge_id).await?;
    println!("{}", serde_json::to_string_pretty(&bridge_config)?);

    Ok(())
}

async fn run_coin_info(config_path: &str, struct_tag: &str, l2_token_hex: &str) -> Result<()> {
    let config = Config::load(config_path)?;
    let client = LcdClient::new(config.l2_client_config())?;

    let l2_token = hex::decode(l2_token_hex.trim_start_matches("0x"))
        .map_err(|e| anyhow::anyhow!("Invalid L2 token hex: {}", e))?;

    let coin_info = query_coin_info(&client, struct_tag, &l2_token).await?;
    println!("{}", serde_json::to_string_pretty(&coin_info)?);

    Ok(())
}

async fn run_wait_tx(config_path: &str, tx_hash: &str, timeout: u64) -> Result<()> {
    if timeout == 0 || timeout > MAX_WAIT_SECS {
        bail!("Timeout must be between 1 and {} seconds", MAX_WAIT_SECS);
    }

    let config = Config::load(config_path)?;
    let client = LcdClient::new(config.l2_client_config())?;

    info!("Waiting up to {}s for transaction {}", timeout, tx_hash);
    match await_confirmation(&client, tx_hash, Duration::from_secs(timeout)).await {
        Some(tx_info) => {
            println!("{}", serde_json::to_string_pretty(&tx_info)?);
            Ok(())
        }
        None => bail!("Transaction {} not confirmed within {} seconds", tx_hash, timeout),
    }
}

async fn run_broadcast(config_path: &str, tx_file: &str, no_wait: bool) -> Result<()> {
    let config = Config::load(config_path)?;
    let client = LcdClient::new(config.l2_client_config())?;

    let raw = std::fs::read_to_string(tx_file)?;
    let tx_bytes = BASE64
        .decode(raw.trim())
        .map_err(|e| anyhow::anyhow!("Invalid base64 transaction in {}: {}", tx_file, e))?;

    let response = client.broadcast_tx(&tx_bytes).await?;
    if response.code != 0 {
        bail!("{}", response.raw_log);
    }
    info!("Broadcast accepted: {}", response.tx_hash);

    if no_wait {
        println!("{}", response.tx_hash);
        return Ok(());
    }

    let timeout = config.bridge.confirm_timeout;
    match await_confirmation(&client, &response.tx_hash, Duration::from_secs(timeout)).await {
        Some(tx_info) => {
            println!("{}", serde_json::to_string_pretty(&tx_info)?);
            Ok(())
        }
        None => bail!(
            "Transaction {} not confirmed within {} seconds",
            response.tx_hash,
            timeout
        ),
    }
}

async fn run_status(config_path: &str) -> Result<()> {
    let config = Config::load(config_path)?;

    for (label, client_config) in [
        ("L1", config.l1_client_config()),
        ("L2", config.l2_client_config()),
    ] {
        let client = LcdClient::new(client_config)?;
        let node_info = client.node_info().await?;
        let height = client.latest_block_height().await?;
        info!(
            "{}: chain_id={} moniker={} version={} height={}",
            label, node_info.chain_id, node_info.moniker, node_info.node_version, height
        );
    }

    Ok(())
}

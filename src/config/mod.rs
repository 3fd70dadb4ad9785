pub mod consts;

use alloy::primitives::Address;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::config::consts::{
    DAILY_REPORT_UTC_HOUR, DEFAULT_CHECKPOINT_PATH, DEFAULT_DEPOSIT_CONTRACT,
    DEFAULT_DEPOSIT_EVENT_TOPIC, DEFAULT_INDEXER_URL, DEFAULT_LOOKBACK_SECS,
    DEFAULT_TICK_INTERVAL_SECS,
};

/// CLI arguments for the treasury keeper
#[derive(Parser, Debug)]
#[command(name = "treasury_keeper")]
#[command(about = "Treasury keeper - deposit monitoring and automated multisig execution", long_about = None)]
pub struct CliArgs {
    /// Block-indexing API endpoint
    #[arg(long, env = "INDEXER_API_URL", default_value = DEFAULT_INDEXER_URL)]
    pub indexer_url: String,

    /// API key for the block-indexing service
    #[arg(long, env = "INDEXER_API_KEY")]
    pub indexer_api_key: String,

    /// Deposit contract watched for large transfers
    #[arg(long, env = "DEPOSIT_CONTRACT_ADDRESS", default_value = DEFAULT_DEPOSIT_CONTRACT)]
    pub deposit_contract: String,

    /// Event topic the deposit log queries filter on
    #[arg(long, env = "DEPOSIT_EVENT_TOPIC", default_value = DEFAULT_DEPOSIT_EVENT_TOPIC)]
    pub deposit_event_topic: String,

    /// Base URL of the multisig coordination service
    #[arg(long, env = "SAFE_SERVICE_URL")]
    pub safe_service_url: String,

    /// Address of the multisig wallet
    #[arg(long, env = "SAFE_ADDRESS")]
    pub safe_address: String,

    /// RPC endpoint for balance reads and transaction submission
    #[arg(long, env = "RPC_URL")]
    pub rpc_url: String,

    /// Staking contract whose native balance gates executions
    #[arg(long, env = "STAKING_CONTRACT_ADDRESS")]
    pub staking_contract_address: String,

    /// Private key of the executor account
    #[arg(long, env = "PRIVATE_KEY")]
    pub private_key: String,

    /// Path of the scan checkpoint file
    #[arg(long, env = "CHECKPOINT_PATH", default_value = DEFAULT_CHECKPOINT_PATH)]
    pub checkpoint_path: PathBuf,

    /// Optional TOML file with selector-table overrides
    #[arg(long, env = "SELECTOR_TABLE_PATH")]
    pub selector_table_path: Option<PathBuf>,

    /// Seconds between periodic rechecks
    #[arg(long, env = "TICK_INTERVAL_SECS", default_value_t = DEFAULT_TICK_INTERVAL_SECS)]
    pub tick_interval_secs: u64,

    /// UTC hour after which the once-daily summary is emitted
    #[arg(long, env = "DAILY_REPORT_UTC_HOUR", default_value_t = DAILY_REPORT_UTC_HOUR)]
    pub daily_report_hour: u32,

    /// Lookback window in seconds when no checkpoint exists
    #[arg(long, env = "LOOKBACK_SECS", default_value_t = DEFAULT_LOOKBACK_SECS)]
    pub lookback_secs: u64,
}

/// Keeper configuration with all values resolved and parsed.
#[derive(Debug, Clone)]
pub struct KeeperConfig {
    pub indexer_url: String,
    pub indexer_api_key: String,
    pub deposit_contract: Address,
    pub deposit_event_topic: String,
    pub safe_service_url: String,
    pub safe_address: Address,
    pub rpc_url: String,
    pub staking_contract_address: Address,
    pub private_key: String,
    pub checkpoint_path: PathBuf,
    pub selector_table_path: Option<PathBuf>,
    pub tick_interval_secs: u64,
    pub daily_report_hour: u32,
    pub lookback_secs: u64,
}

impl KeeperConfig {
    pub fn load(args: CliArgs) -> Result<Self> {
        let deposit_contract: Address = args
            .deposit_contract
            .parse()
            .with_context(|| format!("Invalid deposit contract address: {}", args.deposit_contract))?;
        let safe_address: Address = args
            .safe_address
            .parse()
            .with_context(|| format!("Invalid safe address: {}", args.safe_address))?;
        let staking_contract_address: Address = args
            .staking_contract_address
            .parse()
            .with_context(|| {
                format!(
                    "Invalid staking contract address: {}",
                    args.staking_contract_address
                )
            })?;

        Ok(Self {
            indexer_url: args.indexer_url,
            indexer_api_key: args.indexer_api_key,
            deposit_contract,
            deposit_event_topic: args.deposit_event_topic,
            safe_service_url: args.safe_service_url,
            safe_address,
            rpc_url: args.rpc_url,
            staking_contract_address,
            private_key: args.private_key,
            checkpoint_path: args.checkpoint_path,
            selector_table_path: args.selector_table_path,
            tick_interval_secs: args.tick_interval_secs,
            daily_report_hour: args.daily_report_hour,
            lookback_secs: args.lookback_secs,
        })
    }
}

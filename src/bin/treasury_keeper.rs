use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use treasury_keeper::automation::AutomationState;
use treasury_keeper::chain::{connect_provider, connect_signing_provider, BalanceClient};
use treasury_keeper::checkpoint::CheckpointStore;
use treasury_keeper::config::{CliArgs, KeeperConfig};
use treasury_keeper::decode::SelectorTable;
use treasury_keeper::executor::{ExecutionEngine, OnchainSubmitter};
use treasury_keeper::notifier::{LogNotifier, Notifier};
use treasury_keeper::safe::SafeQueueClient;
use treasury_keeper::scanner::api::IndexerClient;
use treasury_keeper::scanner::chunker::ChunkerConfig;
use treasury_keeper::scanner::DepositMonitor;
use treasury_keeper::service::KeeperService;
use treasury_keeper::supervisor::Scheduler;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy()
        .add_directive("alloy=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(true))
        .with(filter)
        .init();

    let cli_args = CliArgs::parse();
    let config = KeeperConfig::load(cli_args)?;

    let selectors = SelectorTable::load(config.selector_table_path.as_ref())?;

    let indexer = IndexerClient::new(
        config.indexer_url.clone(),
        config.indexer_api_key.clone(),
        config.deposit_contract,
        config.deposit_event_topic.clone(),
    )?;
    let monitor = DepositMonitor::new(
        indexer,
        CheckpointStore::new(&config.checkpoint_path),
        ChunkerConfig::default(),
        config.lookback_secs,
    );

    let queue = SafeQueueClient::new(
        config.safe_service_url.clone(),
        config.safe_address.to_string(),
    )?;

    let read_provider = connect_provider(&config.rpc_url).await?;
    let balances = BalanceClient::new(read_provider, config.staking_contract_address);

    let (signing_provider, executor_address) =
        connect_signing_provider(&config.rpc_url, &config.private_key).await?;
    info!(executor = %executor_address, safe = %config.safe_address, "Keeper initialized");

    let automation = Arc::new(AutomationState::new());
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);

    let submitter = Arc::new(OnchainSubmitter::new(signing_provider, config.safe_address));
    let engine = ExecutionEngine::new(submitter, automation.clone(), notifier.clone());

    let service = Arc::new(KeeperService::new(
        monitor,
        queue,
        balances,
        engine,
        automation,
        selectors,
    ));

    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_clone.cancel();
    });

    info!("Press Ctrl+C to gracefully shutdown");

    let scheduler = Scheduler::new(
        service,
        notifier,
        Duration::from_secs(config.tick_interval_secs),
        config.daily_report_hour,
        shutdown,
    );
    scheduler.run().await;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate()).expect("Failed to register SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("Failed to register SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => info!("Shutdown signal received (SIGTERM)"),
            _ = sigint.recv() => info!("Shutdown signal received (SIGINT/Ctrl+C)"),
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received (Ctrl+C)");
        }
    }
}

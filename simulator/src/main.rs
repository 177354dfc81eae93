//! TinyDEX Simulator
//!
//! Deploys a ledger, replays scenarios or drives concurrent random traffic,
//! and checks that the supply is conserved.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tinydex_ledger::{Ledger, LedgerConfig};

mod accounts;
mod controller;
mod metrics;
mod scenario;

use controller::SimulationController;
use scenario::Scenario;

/// TinyDEX Simulator CLI
#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "TinyDEX token ledger scenario and load simulator")]
struct Args {
    /// Number of simulated holders to create
    #[arg(short, long, default_value = "8")]
    accounts: usize,

    /// Scenario to run (built-in name or path to a .json file)
    #[arg(short, long)]
    scenario: Option<String>,

    /// Random calls to submit in load mode
    #[arg(short, long, default_value = "10000")]
    operations: usize,

    /// Concurrent submitting tasks in load mode
    #[arg(short, long, default_value = "8")]
    workers: usize,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Write the final ledger snapshot as JSON to this path
    #[arg(long)]
    dump_snapshot: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = LedgerConfig::from_env()?;

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
    );
    if args.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("Starting TinyDEX Simulator");

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let ledger = Arc::new(Ledger::deploy(&config)?);
    let metadata = ledger.metadata();
    info!(
        name = %metadata.name,
        symbol = %metadata.symbol,
        decimals = metadata.decimals,
        total_supply = %metadata.total_supply,
        deployer = %ledger.deployer(),
        "Ledger ready"
    );

    let controller = SimulationController::new(Arc::clone(&ledger), args.accounts, args.seed);

    if let Some(scenario_name) = &args.scenario {
        let scenario = Scenario::load(scenario_name)?;
        controller.run_scenario(&scenario)?;
        info!(scenario = %scenario.name, steps = scenario.steps.len(), "Scenario passed");
    } else {
        info!(
            operations = args.operations,
            workers = args.workers,
            "Running load"
        );
        let observed = controller.run_load(args.operations, args.workers).await?;
        info!(
            received = observed.received,
            lagged = observed.lagged,
            "Events observed by subscriber"
        );
    }

    // Print metrics
    let metrics = controller.get_metrics();
    info!("Simulation complete");
    info!("Total calls: {}", metrics.total_operations);
    info!("Successful: {}", metrics.successful_operations);
    info!("Rejected: {}", metrics.failed_operations);
    for (kind, count) in &metrics.successes_by_kind {
        info!("  {} succeeded: {}", kind, count);
    }
    for (code, count) in &metrics.failures_by_code {
        info!("  {} rejections: {}", code, count);
    }
    info!("Success rate: {:.2}%", metrics.success_rate() * 100.0);
    info!(
        "Latency: avg {}µs, p99 {}µs",
        metrics.average_latency_us(),
        metrics.p99_latency_us()
    );

    let report = ledger.verify_integrity();
    info!(
        holders = report.holders,
        total_supply = %report.total_supply,
        consistent = report.is_consistent(),
        "Integrity check"
    );

    if let Some(path) = &args.dump_snapshot {
        let json = serde_json::to_string_pretty(&ledger.snapshot())?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "Snapshot written");
    }

    if !report.is_consistent() {
        return Err(anyhow::anyhow!(
            "Supply not conserved: balances sum to {:?}, total supply {}",
            report.balance_sum,
            report.total_supply
        ));
    }

    Ok(())
}

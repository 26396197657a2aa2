//! loadho-sim - load-adaptive handover scenario runner
//!
//! Loads a scenario, runs it to the end of its simulated time and prints the
//! handover decisions and the final per-cell thresholds.
//!
//! # Usage
//!
//! ```bash
//! loadho-sim -c config/loaded-cell.yaml
//! loadho-sim -c config/loaded-cell.yaml --static --log-level debug
//! ```

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use loadho_common::{init_logging, LogLevel, ThresholdMode};
use loadho_sim::{EngineTrace, Scenario};

/// loadho-sim - load-adaptive A2/A4 handover simulator
#[derive(Parser, Debug)]
#[command(name = "loadho-sim")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the scenario file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config_file: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log-level", default_value = "info")]
    log_level: LogLevel,

    /// Run with the static baseline threshold instead of the load controller
    #[arg(long = "static")]
    static_mode: bool,

    /// Print the full trace as YAML instead of the summary
    #[arg(long = "yaml")]
    yaml: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(args.log_level);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("loadho-sim failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    info!("Loading scenario from: {}", args.config_file);
    let mut scenario = Scenario::from_yaml_file(&args.config_file)
        .with_context(|| format!("Failed to load scenario from {}", args.config_file))?;

    if args.static_mode {
        scenario.config.controller.mode = ThresholdMode::Static;
    }

    let mut engine = scenario
        .build_engine()
        .context("Failed to build handover engine")?;
    let end_ms = engine.config().time.total_duration_ms();
    engine.run_until(end_ms);

    if args.yaml {
        let yaml = serde_yaml::to_string(engine.trace()).context("Failed to serialize trace")?;
        print!("{yaml}");
        return Ok(());
    }

    print_trace(engine.trace());

    println!();
    println!("Final thresholds ({} mode):", engine.policy().mode());
    for (cell, threshold) in engine.thresholds() {
        println!("  cell {cell}: {threshold}");
    }

    let stats = engine.stats();
    println!();
    println!(
        "Reports: {} received, {} discarded, {} while pending",
        stats.reports_received, stats.reports_discarded, stats.reports_while_pending
    );
    println!(
        "Handovers: {} A2 trigger(s), {} recover(ies), {} decision(s), {} succeeded, {} failed",
        stats.a2_triggers,
        stats.recoveries,
        stats.decisions,
        stats.handover_successes,
        stats.handover_failures
    );

    Ok(())
}

fn print_trace(trace: &EngineTrace) {
    println!("Handover decisions:");
    if trace.decisions.is_empty() {
        println!("  (none)");
    }
    for d in &trace.decisions {
        println!(
            "  {:>8} ms  UE {}: cell {} -> cell {}",
            d.time_ms, d.ue_id, d.source, d.target
        );
    }

    let changes: Vec<_> = trace.threshold_changes().collect();
    if !changes.is_empty() {
        println!();
        println!("Threshold changes:");
        for u in changes {
            println!(
                "  {:>8} ms  cell {}: {} -> {} ({} attached)",
                u.time_ms, u.cell, u.previous, u.threshold, u.attached
            );
        }
    }
}

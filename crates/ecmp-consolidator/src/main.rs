//! ECMP group consolidator entry point.
//!
//! Replays routing snapshot files through the consolidator in order and
//! prints the resulting group table as JSON.

use anyhow::Context;
use clap::Parser;
use log::{error, info};
use sonic_ecmp_consolidator::config::{ConsolidatorConfig, DEFAULT_CONFIG_PATH};
use sonic_ecmp_consolidator::state::file::load_snapshot;
use sonic_ecmp_consolidator::ConsolidatorHandle;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// SONiC ECMP Group Consolidator
#[derive(Parser, Debug)]
#[command(name = "ecmp-consolidator")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Enable consolidation regardless of the configuration file
    #[arg(long)]
    enable: bool,

    /// Print the group table with indentation
    #[arg(long)]
    pretty: bool,

    /// Snapshot files, applied in order
    #[arg(required = true)]
    snapshots: Vec<PathBuf>,
}

fn run(args: &Args) -> anyhow::Result<()> {
    let mut config = ConsolidatorConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if args.enable {
        config.consolidate_ecmp_groups = true;
    }

    let handle = ConsolidatorHandle::new(&config);

    for path in &args.snapshots {
        let snapshot = load_snapshot(path)
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        info!(
            "Publishing {} ({} routes, {} resolved)",
            path.display(),
            snapshot.route_count(),
            snapshot.resolved_route_count()
        );
        handle
            .publish(Arc::new(snapshot))
            .with_context(|| format!("applying snapshot {}", path.display()))?;
    }

    let groups = handle.export();
    let output = if args.pretty {
        serde_json::to_string_pretty(&groups)?
    } else {
        serde_json::to_string(&groups)?
    };
    println!("{}", output);

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    info!("Starting SONiC ECMP group consolidator");

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

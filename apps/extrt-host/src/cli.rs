//! CLI command handling for the extension runtime host, in the style of
//! `apps/codebuddy`'s `cli.rs`.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use extrt_config::Config;

use crate::runtime::Host;

#[derive(Parser)]
#[command(name = "extrt")]
#[command(about = "Discovers, resolves, loads, and runs extensions against a shared host")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover extensions under a directory, run the full pipeline, tick
    /// the Update fan-out, then shut everything down cleanly.
    Run {
        /// Directory to discover `.pmodule`/`.pplugin` files under.
        dir: PathBuf,
        /// Number of Update ticks to run before shutting down.
        #[arg(long, default_value = "1")]
        ticks: u64,
        /// Simulated delta time per tick, in milliseconds.
        #[arg(long, default_value = "16")]
        tick_ms: u64,
    },
    /// Parse and resolve extensions under a directory without loading any
    /// of them; reports the load order or why resolution failed.
    Check {
        /// Directory to discover `.pmodule`/`.pplugin` files under.
        dir: PathBuf,
    },
}

/// Main CLI entry point.
pub fn run() {
    let cli = Cli::parse();

    let config = Config::load(&std::env::current_dir().unwrap_or_default()).unwrap_or_default();
    extrt_config::logging::init(&config);

    match cli.command {
        Commands::Run { dir, ticks, tick_ms } => run_command(config, &dir, ticks, tick_ms),
        Commands::Check { dir } => check_command(config, &dir),
    }
}

fn run_command(config: Config, dir: &std::path::Path, ticks: u64, tick_ms: u64) {
    let host = Host::new(config);
    let mut bootstrap = match host.bootstrap(dir) {
        Ok(bootstrap) => bootstrap,
        Err(e) => {
            error!(error = %e, "bootstrap failed");
            process::exit(1);
        }
    };

    report_summary(&bootstrap.report, &bootstrap.extensions);

    let dt = Duration::from_millis(tick_ms);
    for tick in 0..ticks {
        info!(tick, "update fan-out");
        host.update(&mut bootstrap.extensions, dt);
    }

    host.shutdown(&mut bootstrap.extensions, &bootstrap.graphs);
    info!("shutdown complete");
}

fn check_command(config: Config, dir: &std::path::Path) {
    let host = Host::new(config);
    let bootstrap = match host.check(dir) {
        Ok(bootstrap) => bootstrap,
        Err(e) => {
            error!(error = %e, "check failed");
            process::exit(1);
        }
    };
    report_summary(&bootstrap.report, &bootstrap.extensions);
}

fn report_summary(report: &extrt_pipeline::Report, extensions: &[extrt_core::Extension]) {
    for stage in &report.stages {
        info!(
            stage = %stage.name,
            items_in = stage.items_in,
            items_out = stage.items_out,
            succeeded = stage.succeeded,
            failed = stage.failed,
            elapsed_ms = stage.elapsed.as_millis() as u64,
            "stage summary"
        );
    }
    for ext in extensions {
        if ext.has_errors() {
            for error in ext.errors() {
                error!(extension = %ext.name(), %error, "extension error");
            }
        }
        println!("{ext}");
    }
}

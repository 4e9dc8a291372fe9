/*!
 * Command-line interface for treegauge
 */

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use treegauge::config::{Args, Config};
use treegauge::server::{self, resolve_request_path};
use treegauge::walker::TreeWalker;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_args(args);

    setup_logging(config.log_level())?;

    config.validate().context("Invalid configuration")?;

    let walker =
        TreeWalker::with_threads(config.num_threads).context("Failed to build thread pool")?;

    if let Some(request_path) = &config.print_path {
        return print_once(&config, &walker, request_path);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime
        .block_on(server::serve(&config, walker))
        .context("Server failed")
}

/// Walk one path under the root and print its description to stdout
fn print_once(config: &Config, walker: &TreeWalker, request_path: &str) -> Result<()> {
    let target = resolve_request_path(&config.root, request_path)
        .with_context(|| format!("Path escapes the root directory: {}", request_path))?;
    info!(path = %target.display(), "walking");

    let json = walker
        .walk_with(&target, |record| serde_json::to_string_pretty(&record))
        .with_context(|| format!("Failed to describe {}", target.display()))?;
    println!("{}", json?);
    Ok(())
}

fn setup_logging(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .context("Invalid log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    Ok(())
}

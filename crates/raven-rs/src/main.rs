//! Interactive chat with the Raven agent.

use anyhow::Context;
use clap::Parser;
use log::{debug, info};
use raven_rs::config::{LayeredConfigOptions, RavenConfig};
use raven_rs::{ChatLabels, build_orchestrator, init_logging, run_repl};
use std::path::PathBuf;
use tokio::io::{BufReader, stdin, stdout};

/// Command-line options for the chat loop.
#[derive(Parser)]
#[command(name = "raven", version)]
struct Cli {
    /// Extra raven.json5 layered on top of user, project, and cwd configs
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let cwd = std::env::current_dir().context("cwd")?;
    info!(
        "starting chat (cwd={}, config_set={})",
        cwd.display(),
        cli.config.is_some()
    );
    let mut options = LayeredConfigOptions::new(&cwd);
    if let Some(path) = cli.config.as_ref() {
        options = options.with_runtime_path(path);
    }
    let layered =
        RavenConfig::load_layered_with_options(options).context("failed to load config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());
    let config = layered.config;

    let orchestrator = build_orchestrator(&config)?;
    run_repl(
        &orchestrator,
        &ChatLabels::from(&config),
        BufReader::new(stdin()),
        stdout(),
    )
    .await
    .context("chat loop failed")?;
    Ok(())
}

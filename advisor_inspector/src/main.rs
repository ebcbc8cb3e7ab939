use std::fs;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::Result;
use tracing::info;

use advisor_core::{AdvisorConfig, Enricher, LogWatcher, RawSnapshot};
use state_codec::extract_latest;

mod render;

use render::render_summary;

#[derive(Parser, Debug)]
#[command(author, version, about = "Turn advisor log inspector", long_about = None)]
struct Cli {
    /// Path to the host's append-only log file.
    #[arg(long)]
    log: PathBuf,
    /// Advisor configuration file (JSON); defaults come from
    /// ADVISOR_CONFIG_PATH or the built-in values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the configured mini-map radius.
    #[arg(long)]
    radius: Option<i32>,
    /// Process the existing log once and exit instead of tailing it.
    #[arg(long)]
    once: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AdvisorConfig::from_file(path)?,
        None => AdvisorConfig::load_from_env().0,
    };
    if let Some(radius) = cli.radius {
        config.minimap.radius = radius;
    }

    let mut enricher = Enricher::new(config.clone());

    if cli.once {
        let bytes = fs::read(&cli.log)?;
        let content = String::from_utf8_lossy(&bytes);
        match extract_latest(&content) {
            Some(value) => {
                let enriched = enricher.enrich(RawSnapshot::from_value(&value));
                println!("{}", render_summary(&enriched));
            }
            None => println!("No complete game state in {}.", cli.log.display()),
        }
        return Ok(());
    }

    info!("Following {}. Ctrl+C to exit.", cli.log.display());
    let (watcher, snapshots) = LogWatcher::spawn(cli.log.clone(), config.watcher.clone());

    while let Ok(mut raw) = snapshots.recv() {
        // A newer poll result supersedes anything still queued; enrichment
        // runs strictly one snapshot at a time.
        while let Ok(newer) = snapshots.try_recv() {
            raw = newer;
        }
        let enriched = enricher.enrich(raw);
        println!("{}", render_summary(&enriched));
    }

    watcher.shutdown();
    Ok(())
}

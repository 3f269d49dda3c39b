//! graphclaw CLI: inspect the kind taxonomy, validate and plan discovery
//! batches.

use anyhow::Context;
use clap::{Parser, Subcommand};
use graphclaw::commands;
use graphclaw::config::{GraphclawConfig, DEFAULT_CONFIG_FILE};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "graphclaw",
    version = env!("CARGO_PKG_VERSION"),
    about = "Discovery graph node model: validate and order scan batches"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (TOML). Missing file means defaults.
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the kind tree
    Taxonomy,
    /// Validate a batch of wire entities; exits non-zero on any rejection
    Validate {
        /// JSON file: {"entities": [...]} or a bare array
        batch: PathBuf,
    },
    /// Validate and order a batch, print it as JSON
    Plan {
        batch: PathBuf,
    },
    /// Print the default config as TOML
    InitConfig,
}

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "graphclaw=info,graphclaw_schema=info,graphclaw_discovery=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(guard)
}

async fn read_wire(path: &Path) -> anyhow::Result<graphclaw_discovery::WireBatch> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;
    let wire = commands::parse_wire(&text)?;
    tracing::info!(entities = wire.entities.len(), "read {}", path.display());
    Ok(wire)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref())?;

    match cli.command {
        Commands::Taxonomy => {
            print!("{}", commands::render_taxonomy());
        }
        Commands::InitConfig => {
            print!("{}", GraphclawConfig::default().to_toml());
        }
        Commands::Validate { batch } => {
            let config = GraphclawConfig::load(&cli.config);
            let wire = read_wire(&batch).await?;
            let batch = commands::assemble(wire, &config);
            print!("{}", commands::render_report(&batch));
            if !batch.is_clean() {
                anyhow::bail!("{} entities rejected", batch.rejected.len());
            }
        }
        Commands::Plan { batch } => {
            let config = GraphclawConfig::load(&cli.config);
            let wire = read_wire(&batch).await?;
            let batch = commands::assemble(wire, &config);
            println!("{}", commands::render_plan(&batch, config.output.pretty)?);
        }
    }

    Ok(())
}

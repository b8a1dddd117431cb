use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use cflogs_core::config::Config;
use cflogs_core::{BatchProcessor, SystemClock};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cflogs", about = "Load CloudFront real-time logs into a key-value store")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, global = true)]
    debug: bool,

    /// TOML config file layered over the built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Target table; overrides DYNAMODB_TABLE.
    #[arg(long, global = true)]
    table: Option<String>,

    /// Keep records in memory instead of writing to the store.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process event batches from a file (or stdin) and exit.
    Process {
        /// Event JSON or NDJSON file; stdin when omitted or `-`.
        #[arg(long, short)]
        input: Option<PathBuf>,
    },
    /// Accept batches over HTTP on POST /invoke.
    Serve {
        #[arg(long, default_value = "127.0.0.1:9000")]
        listen: SocketAddr,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(if cli.debug { "debug" } else { "info" })
            }),
        )
        .init();

    let env = std::env::vars().chain(
        cli.table
            .clone()
            .map(|table| ("DYNAMODB_TABLE".to_string(), table)),
    );
    let config = Config::load_from(cli.config.as_deref(), env).context("failed to load config")?;
    let store = cflogs::build_store(&config, cli.dry_run)?;
    let processor = Arc::new(BatchProcessor::from_config(
        &config,
        store,
        Arc::new(SystemClock),
    ));

    match cli.command {
        Command::Process { input } => {
            let mut feed = cflogs_feeds::open(input);
            let summary = cflogs::runner::run_feed(
                feed.as_mut(),
                &processor,
                &mut std::io::stdout().lock(),
                &mut std::io::stderr().lock(),
            )
            .await?;
            Ok(if summary.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Serve { listen } => {
            let listener = tokio::net::TcpListener::bind(listen)
                .await
                .with_context(|| format!("failed to bind {listen}"))?;
            cflogs::server::serve(listener, processor).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

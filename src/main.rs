//! fieldglean - Learning text extraction service
//!
//! Pulls structured records out of free-form text with regex detectors,
//! remembers every field name it has seen, and serves the whole pipeline
//! over HTTP.

use anyhow::Result;
use clap::{Parser, Subcommand};
use fieldglean::{
    api::build_app,
    config::AppConfig,
    export,
    ingest::{merge_inputs, PlainTextDecoder, TextDecoder},
    service::ExtractionService,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fieldglean")]
#[command(version)]
#[command(about = "Learning text extraction service")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "FIELDGLEAN_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to (overrides configuration)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides configuration)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Extract a record from text and print it as JSON
    Analyze {
        /// File to read input text from
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Text passed directly on the command line
        #[arg(short, long)]
        text: Option<String>,
    },

    /// Flatten records from a JSON file into (Field, Value) rows
    Export {
        /// File holding one record or an array of records
        file: PathBuf,
    },

    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("fieldglean={},tower_http=debug", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match cli.config {
        Some(config_path) => AppConfig::load(&config_path)?,
        None => AppConfig::default(),
    };

    match cli.command {
        Commands::Serve { host, port } => {
            run_serve(config, host, port).await?;
        }
        Commands::Analyze { file, text } => {
            run_analyze(config, file, text).await?;
        }
        Commands::Export { file } => {
            run_export(file).await?;
        }
        Commands::Config { default } => {
            show_config(if default { None } else { Some(&config) })?;
        }
    }

    Ok(())
}

async fn run_serve(config: AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let origins = config.server.allowed_origins.clone();

    let service = Arc::new(ExtractionService::new(&config).await?);
    let app = build_app(service, &origins);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    tracing::info!("fieldglean listening on http://{}:{}", host, port);
    tracing::info!("Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        })
        .await?;

    Ok(())
}

async fn run_analyze(config: AppConfig, file: Option<PathBuf>, text: Option<String>) -> Result<()> {
    let decoded = match file {
        Some(path) => {
            let bytes = tokio::fs::read(&path).await?;
            Some(PlainTextDecoder.decode(&bytes).await?)
        }
        None => None,
    };

    let input = merge_inputs(decoded.as_deref(), text.as_deref());

    let service = ExtractionService::new(&config).await?;
    let record = service.analyze(&input).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);

    // The background persistence would be dropped at process exit
    service.flush().await?;

    Ok(())
}

async fn run_export(file: PathBuf) -> Result<()> {
    let content = tokio::fs::read_to_string(&file).await?;
    let payload: serde_json::Value = serde_json::from_str(&content)?;

    let rows = match &payload {
        serde_json::Value::Array(records) => export::flatten_all(records.iter()),
        other => export::flatten(other),
    };
    println!("{}", serde_json::to_string_pretty(&rows)?);

    Ok(())
}

fn show_config(config: Option<&AppConfig>) -> Result<()> {
    let config = config.cloned().unwrap_or_default();
    let toml = toml::to_string_pretty(&config)?;
    println!("{}", toml);
    Ok(())
}

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use uuid::Uuid;

use doc_classifier::classifier::Classifier;
use doc_classifier::config::Config;
use doc_classifier::extraction::Extractor;
use doc_classifier::models::{DocumentClassification, UploadedFile};
use doc_classifier::routes::{classify::classify_file, create_router};
use doc_classifier::utils::init_tracing;
use doc_classifier::AppState;

#[derive(Parser)]
#[command(name = "doc-classifier", version, about = "Document classification service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Classify local files and print the results as JSON
    Classify {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("Invalid configuration")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Classify { files } => classify(config, files).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    info!(server = ?config.server, debug = config.debug, "Configuration loaded");

    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid HOST: {}", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);

    let state = AppState::from_config(config).context("Failed to initialise services")?;
    let app = create_router(state);

    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

async fn classify(config: Config, paths: Vec<PathBuf>) -> anyhow::Result<()> {
    let extractor = Arc::new(Extractor::from_config(&config.ocr));
    let classifier = Classifier::from_config(&config).context("Failed to initialise classifier")?;

    let mut results = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let file = UploadedFile::new(filename, "", bytes);
        let classification = classify_file(&extractor, &classifier, &file).await?;

        results.push(DocumentClassification {
            document_id: Uuid::new_v4().to_string(),
            document_name: file.filename,
            document_type: classification.document_type,
            confidence_score: classification.confidence_score,
            metadata: classification.metadata,
        });
    }

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

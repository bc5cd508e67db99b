use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use pdfchat::application::services::{IngestionMode, IngestionService};
use pdfchat::config::AppConfig;
use pdfchat::infrastructure::AppContainer;
use pdfchat::presentation::http::HttpServer;

#[derive(Parser)]
#[command(
    name = "pdfchat",
    version,
    about = "Ask questions about a PDF through a small retrieval-augmented HTTP service"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve(ServeArgs),
    /// Load a PDF into the vector store and exit
    Ingest {
        pdf: PathBuf,
        #[arg(long)]
        collection: Option<String>,
        /// Drop chunks previously ingested from the same file first
        #[arg(long)]
        replace: bool,
    },
}

#[derive(Args, Default)]
struct ServeArgs {
    #[arg(long)]
    port: Option<u16>,
    /// Ingest this PDF before accepting requests
    #[arg(long)]
    preload: Option<PathBuf>,
}

async fn ingest(
    service: &IngestionService,
    pdf: &Path,
    mode: IngestionMode,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = service.ingest_file(pdf, mode).await?;

    tracing::info!(
        "Ingested {}: {} pages, {} chunks into {} ({} replaced)",
        report.source,
        report.pages,
        report.chunks_created,
        report.collection_name,
        report.chunks_replaced
    );
    println!(
        "Ingestion done: {} pages, {} chunks, {} embeddings stored in {}",
        report.pages, report.chunks_created, report.embeddings_created, report.collection_name
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;

    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Ingest {
            pdf,
            collection,
            replace,
        } => {
            if let Some(collection) = collection {
                config.collection_name = collection;
            }
            let mode = if replace {
                IngestionMode::ReplaceSource
            } else {
                IngestionMode::Append
            };

            let container = AppContainer::new(config).await?;
            ingest(&container.ingestion_service, &pdf, mode).await
        }
        Command::Serve(args) => {
            if let Some(port) = args.port {
                config.port = port;
            }
            let port = config.port;

            let container = AppContainer::new(config).await?;
            container.recover_interrupted_jobs().await?;
            if let Some(pdf) = args.preload {
                ingest(&container.ingestion_service, &pdf, IngestionMode::ReplaceSource).await?;
            }

            let server = HttpServer::new(
                container.chat_handler.clone(),
                container.health_handler.clone(),
                container.background_processor.clone(),
                port,
            );
            server.run().await
        }
    }
}

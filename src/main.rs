use clap::{Parser, Subcommand};
use docs_rag::Result;
use docs_rag::commands::{ask, ingest, run_query_loop, show_status};
use docs_rag::config::{Config, resolve_base_dir, run_interactive_config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docs-rag")]
#[command(about = "Answer questions about a folder of PDF and text documents with a local LLM")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml and the index (default: ~/.docs-rag)
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama connection and pipeline settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Chunk, embed and index the documents in a directory, replacing any previous index
    Ingest {
        /// Directory to ingest (default: ingestion.docs_dir from the config)
        dir: Option<PathBuf>,
    },
    /// Answer a single question from the index
    Ask {
        /// The question to answer
        question: String,
        /// Number of chunks to retrieve
        #[arg(long)]
        k: Option<usize>,
        /// Print the retrieved chunks after the answer
        #[arg(long)]
        sources: bool,
    },
    /// Answer questions interactively until end of input
    Query {
        /// Number of chunks to retrieve
        #[arg(long)]
        k: Option<usize>,
        /// Print the retrieved chunks after each answer
        #[arg(long)]
        sources: bool,
    },
    /// Show Ollama health and index status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let base_dir = resolve_base_dir(cli.base_dir).map_err(anyhow::Error::from)?;
    let config = Config::load(&base_dir)?;

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&config)?;
            } else {
                run_interactive_config(config)?;
            }
        }
        Commands::Ingest { dir } => {
            ingest(&config, dir).await?;
        }
        Commands::Ask {
            question,
            k,
            sources,
        } => {
            ask(&config, &question, k, sources).await?;
        }
        Commands::Query { k, sources } => {
            run_query_loop(&config, k, sources).await?;
        }
        Commands::Status => {
            show_status(&config).await?;
        }
    }

    Ok(())
}

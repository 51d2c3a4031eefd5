use anyhow::{Context, Result};
use dialoguer::Input;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::database::{IndexManifest, VectorStore};
use crate::indexer::{Indexer, IndexingStats};
use crate::ollama::OllamaClient;
use crate::query::{Answer, QueryEngine};
use crate::retrieval::RetrievedChunk;

const ANSWER_SEPARATOR_WIDTH: usize = 80;
const STATUS_TIMEOUT: Duration = Duration::from_secs(10);

/// Ingest every supported file in `dir` (or the configured documents directory)
#[inline]
pub async fn ingest(config: &Config, dir: Option<PathBuf>) -> Result<IndexingStats> {
    let dir = dir.unwrap_or_else(|| config.docs_dir().to_path_buf());
    info!("Ingesting documents from {}", dir.display());

    let client = OllamaClient::new(config).context("Failed to initialize Ollama client")?;

    let stats = Indexer::new(config.clone())
        .ingest_directory(&dir, &client)
        .await?;

    println!("Indexed {} chunks", stats.chunks_created);
    debug!(
        "{} documents, {} dimensions, {:?}",
        stats.documents_loaded, stats.embedding_dimension, stats.duration
    );

    Ok(stats)
}

/// Open the index with the configured Ollama models
#[inline]
pub async fn open_engine(config: &Config) -> Result<QueryEngine> {
    let client =
        Arc::new(OllamaClient::new(config).context("Failed to initialize Ollama client")?);

    let engine = QueryEngine::open(config, Arc::<OllamaClient>::clone(&client), client).await?;
    Ok(engine)
}

/// Answer a single question and print it
#[inline]
pub async fn ask(
    config: &Config,
    question: &str,
    k: Option<usize>,
    show_sources: bool,
) -> Result<()> {
    let engine = open_engine(config).await?;
    let answer = engine.answer(question, k).await?;

    write_answer(&mut io::stdout(), &answer, show_sources)?;
    Ok(())
}

/// Interactive question loop; ends on end of input
#[inline]
pub async fn run_query_loop(config: &Config, k: Option<usize>, show_sources: bool) -> Result<()> {
    let engine = open_engine(config).await?;

    if console::user_attended() {
        loop {
            let question = match Input::<String>::new().with_prompt("Query").interact_text() {
                Ok(question) => question,
                Err(dialoguer::Error::IO(e))
                    if matches!(
                        e.kind(),
                        io::ErrorKind::UnexpectedEof | io::ErrorKind::Interrupted
                    ) =>
                {
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            answer_and_report(&engine, &question, k, show_sources, &mut io::stdout()).await?;
        }
        Ok(())
    } else {
        let stdin = io::BufReader::new(io::stdin());
        answer_lines(&engine, stdin, &mut io::stdout(), k, show_sources).await
    }
}

/// Answer one question per non-blank input line until the input ends.
///
/// A failed question is reported on `output` and the loop moves on.
#[inline]
pub async fn answer_lines<R: BufRead + Send, W: Write + Send>(
    engine: &QueryEngine,
    input: R,
    output: &mut W,
    k: Option<usize>,
    show_sources: bool,
) -> Result<()> {
    for line in input.lines() {
        let line = line.context("Failed to read question")?;
        let question = line.trim();
        if question.is_empty() {
            continue;
        }

        answer_and_report(engine, question, k, show_sources, output).await?;
    }

    Ok(())
}

async fn answer_and_report<W: Write + Send>(
    engine: &QueryEngine,
    question: &str,
    k: Option<usize>,
    show_sources: bool,
    output: &mut W,
) -> Result<()> {
    match engine.answer(question, k).await {
        Ok(answer) => write_answer(output, &answer, show_sources)?,
        Err(e) => {
            warn!("Failed to answer question: {}", e);
            writeln!(output, "Error: {}", e)?;
        }
    }
    writeln!(output, "{}", "-".repeat(ANSWER_SEPARATOR_WIDTH))?;
    output.flush()?;
    Ok(())
}

/// Print the answer verbatim, optionally followed by where it came from
#[inline]
pub fn write_answer<W: Write>(
    output: &mut W,
    answer: &Answer,
    show_sources: bool,
) -> io::Result<()> {
    writeln!(output, "{}", answer.text)?;

    if show_sources && !answer.sources.is_empty() {
        writeln!(output)?;
        writeln!(output, "Sources:")?;
        for (i, chunk) in answer.sources.iter().enumerate() {
            writeln!(output, "  [{}] {}", i + 1, format_source(chunk))?;
        }
    }

    Ok(())
}

#[inline]
pub fn format_source(chunk: &RetrievedChunk) -> String {
    match chunk.page {
        Some(page) => format!(
            "{} (page {}, chunk {}, distance {:.4})",
            chunk.source, page, chunk.chunk_index, chunk.distance
        ),
        None => format!(
            "{} (chunk {}, distance {:.4})",
            chunk.source, chunk.chunk_index, chunk.distance
        ),
    }
}

/// Show Ollama health and the state of the index
#[inline]
pub async fn show_status(config: &Config) -> Result<()> {
    println!("📊 Docs-RAG Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("🤖 Ollama Status:");
    match OllamaClient::new(config) {
        Ok(client) => match client.with_timeout(STATUS_TIMEOUT).health_check() {
            Ok(()) => {
                println!(
                    "   ✅ Ollama: Connected ({}:{})",
                    config.ollama.host, config.ollama.port
                );
                println!("   📋 Embedding Model: {}", config.ollama.embedding_model);
                println!("   💬 Generation Model: {}", config.ollama.generation_model);
                println!("   🔢 Batch Size: {}", config.ollama.batch_size);
            }
            Err(e) => {
                println!("   ⚠️  Ollama: Unhealthy - {:#}", e);
            }
        },
        Err(e) => {
            println!("   ❌ Ollama: Failed to connect - {}", e);
        }
    }

    println!();
    println!("🔍 Index Status:");
    println!("   📁 Location: {}", config.index_path().display());

    let manifest = match IndexManifest::load(&config.manifest_path()) {
        Ok(manifest) => manifest,
        Err(e) => {
            println!("   📭 {}", e);
            return Ok(());
        }
    };

    println!("   🧠 Embedding Model: {}", manifest.embedding_model);
    println!("   📐 Dimension: {}", manifest.embedding_dimension);
    println!(
        "   ✂️  Chunking: {} chars, {} overlap",
        manifest.chunk_size, manifest.chunk_overlap
    );
    println!("   📚 Documents: {}", manifest.document_count);
    println!("   🧩 Chunks: {}", manifest.chunk_count);
    println!("   🕒 Built: {}", manifest.created_at);

    if let Err(e) = manifest.ensure_model(&config.ollama.embedding_model) {
        println!("   ⚠️  {}", e);
    }

    match VectorStore::open_existing(&config.index_path()).await {
        Ok(store) => {
            match store.count_chunks().await {
                Ok(count) => println!("   ✅ LanceDB: {} rows", count),
                Err(e) => println!("   ❌ LanceDB: Failed to count rows - {}", e),
            }
            match store.vector_dimension().await {
                Ok(dimension) if dimension == manifest.embedding_dimension => {
                    println!("   ✅ Stored Dimension: {}", dimension);
                }
                Ok(dimension) => println!(
                    "   ⚠️  Stored Dimension: {} (manifest says {})",
                    dimension, manifest.embedding_dimension
                ),
                Err(e) => println!("   ❌ LanceDB: Failed to read dimension - {}", e),
            }
        }
        Err(e) => println!("   ❌ LanceDB: {}", e),
    }

    Ok(())
}

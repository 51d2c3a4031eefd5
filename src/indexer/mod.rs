// Indexer module
// Embeds chunks and writes them, with a manifest, as the on-disk index

#[cfg(test)]
mod tests;

use std::path::Path;
use std::time::{Duration, Instant};

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::database::{ChunkRecord, IndexManifest, VectorStore};
use crate::embeddings::{Embedder, TextChunk, chunk_documents};
use crate::ingestion::{Document, load_directory};
use crate::{DocsError, Result};

/// Builds the similarity index for one ingestion run
pub struct Indexer {
    config: Config,
}

/// Statistics about an indexing run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexingStats {
    pub documents_loaded: usize,
    pub chunks_created: usize,
    pub embeddings_generated: usize,
    pub embedding_dimension: usize,
    pub duration: Duration,
}

impl Indexer {
    #[inline]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Load, chunk, embed and index every supported file in `dir`
    #[inline]
    pub async fn ingest_directory(
        &self,
        dir: &Path,
        embedder: &dyn Embedder,
    ) -> Result<IndexingStats> {
        info!("Loading documents from {}", dir.display());

        let documents = load_directory(dir).map_err(|e| DocsError::Ingestion(format!("{:#}", e)))?;

        self.index_documents(&documents, embedder).await
    }

    /// Chunk and index already loaded documents, replacing any existing index
    #[inline]
    pub async fn index_documents(
        &self,
        documents: &[Document],
        embedder: &dyn Embedder,
    ) -> Result<IndexingStats> {
        let started = Instant::now();

        let chunks = chunk_documents(documents, &self.config.chunking);
        info!(
            "Split {} documents into {} chunks",
            documents.len(),
            chunks.len()
        );

        let vectors = self.embed_chunks(&chunks, embedder)?;
        let embedding_dimension = self.check_dimensions(&vectors)?;

        let created_at = Utc::now().to_rfc3339();
        let records: Vec<ChunkRecord> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| ChunkRecord::from_chunk(chunk, vector, &created_at))
            .collect();

        let store = VectorStore::connect(&self.config.index_path()).await?;
        store.replace_all(&records, embedding_dimension).await?;

        let manifest = IndexManifest::new(
            &self.config,
            embedder.model_name(),
            embedding_dimension,
            documents.len(),
            records.len(),
        );
        manifest.save(&self.config.manifest_path())?;

        let stats = IndexingStats {
            documents_loaded: documents.len(),
            chunks_created: chunks.len(),
            embeddings_generated: records.len(),
            embedding_dimension,
            duration: started.elapsed(),
        };

        info!(
            "Indexed {} chunks from {} documents in {:.2}s",
            stats.chunks_created,
            stats.documents_loaded,
            stats.duration.as_secs_f64()
        );

        Ok(stats)
    }

    fn embed_chunks(&self, chunks: &[TextChunk], embedder: &dyn Embedder) -> Result<Vec<Vec<f32>>> {
        let batch_size = (self.config.ollama.batch_size as usize).max(1);

        let bar = if console::user_attended_stderr() {
            ProgressBar::new(chunks.len() as u64).with_style(
                ProgressStyle::with_template("{bar:40} [{pos}/{len}] Embedding chunks {msg}")
                    .map_err(|e| DocsError::Other(e.into()))?,
            )
        } else {
            ProgressBar::hidden()
        };

        let mut vectors = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            debug!("Embedding batch of {} chunks", texts.len());

            let embedded = embedder.embed_documents(&texts).map_err(|e| {
                bar.abandon();
                DocsError::Embedding(format!("{:#}", e))
            })?;

            if embedded.len() != texts.len() {
                bar.abandon();
                return Err(DocsError::Embedding(format!(
                    "Expected {} embeddings, received {}",
                    texts.len(),
                    embedded.len()
                )));
            }

            vectors.extend(embedded);
            bar.inc(batch.len() as u64);
        }

        bar.finish_and_clear();
        Ok(vectors)
    }

    /// Every vector must share one dimension; an empty run uses the configured one
    fn check_dimensions(&self, vectors: &[Vec<f32>]) -> Result<usize> {
        let configured = self.config.ollama.embedding_dimension as usize;

        let Some(first) = vectors.first() else {
            return Ok(configured);
        };
        let dimension = first.len();

        if dimension == 0 {
            return Err(DocsError::Embedding(
                "Embedding model returned an empty vector".to_string(),
            ));
        }

        if let Some(position) = vectors.iter().position(|v| v.len() != dimension) {
            return Err(DocsError::Embedding(format!(
                "Chunk {} has embedding dimension {}, expected {}",
                position,
                vectors.get(position).map_or(0, Vec::len),
                dimension
            )));
        }

        if dimension != configured {
            warn!(
                "Embedding model produced {} dimensions but {} are configured; using {}",
                dimension, configured, dimension
            );
        }

        Ok(dimension)
    }
}

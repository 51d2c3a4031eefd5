// Retrieval module
// Nearest-neighbour lookup of stored chunks for a question

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::database::{IndexManifest, SearchResult, VectorStore};
use crate::embeddings::Embedder;
use crate::{DocsError, Result};

/// A stored chunk and its squared L2 distance to the question
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub content: String,
    pub source: String,
    pub page: Option<u32>,
    pub chunk_index: u32,
    pub distance: f32,
}

impl From<SearchResult> for RetrievedChunk {
    #[inline]
    fn from(result: SearchResult) -> Self {
        Self {
            content: result.record.content,
            source: result.record.source,
            page: result.record.page,
            chunk_index: result.record.chunk_index,
            distance: result.distance,
        }
    }
}

/// Read side of the index
pub struct Retriever {
    store: VectorStore,
    manifest: IndexManifest,
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    /// Open the index described by `config`.
    ///
    /// Fails with `IndexNotFound` when nothing was ingested yet and with
    /// `ModelMismatch` when `embedder` is not the model the index was built with.
    #[inline]
    pub async fn open(config: &Config, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let manifest = IndexManifest::load(&config.manifest_path())?;
        manifest.ensure_model(embedder.model_name())?;

        let store = VectorStore::open_existing(&config.index_path()).await?;

        info!(
            "Opened index with {} chunks embedded by {}",
            manifest.chunk_count, manifest.embedding_model
        );

        Ok(Self {
            store,
            manifest,
            embedder,
        })
    }

    #[inline]
    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    /// Return at most `k` chunks closest to `question`, nearest first
    #[inline]
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed_query(question)
            .map_err(|e| DocsError::Embedding(format!("{:#}", e)))?;

        if query_vector.len() != self.manifest.embedding_dimension {
            return Err(DocsError::Embedding(format!(
                "Query embedding has dimension {} but the index was built with {}",
                query_vector.len(),
                self.manifest.embedding_dimension
            )));
        }

        let results = self.store.search(&query_vector, k).await?;
        debug!("Retrieved {} chunks for question", results.len());

        Ok(results.into_iter().map(RetrievedChunk::from).collect())
    }
}

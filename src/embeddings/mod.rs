// Embeddings module
// Content chunking and the embedding seam shared by ingestion and query

pub mod chunking;

use anyhow::Result;

pub use chunking::{ChunkingConfig, TextChunk, chunk_documents, split_text};

/// Turns text into fixed-dimension vectors.
///
/// Ingestion and query must use the same implementation and model, otherwise
/// distances between stored and query vectors are meaningless.
pub trait Embedder: Send + Sync {
    /// Name of the model producing the vectors, recorded in the index manifest
    fn model_name(&self) -> &str;

    /// Embed a batch of chunk texts, one vector per input in the same order
    fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single question
    fn embed_query(&self, text: &str) -> Result<Vec<f32>>;
}

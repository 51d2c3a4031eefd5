// LanceDB vector database module
// Handles vector storage and similarity search for chunk embeddings

#[cfg(test)]
mod tests;

pub mod vector_store;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::embeddings::TextChunk;

/// One row of the `chunks` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Unique identifier for this row
    pub id: String,
    /// The embedding of `content`
    pub vector: Vec<f32>,
    /// Path of the file the chunk came from
    pub source: String,
    /// 0-based page for PDF sources
    pub page: Option<u32>,
    /// Position of the chunk within the ingestion run
    pub chunk_index: u32,
    /// The chunk text handed to the generation model
    pub content: String,
    /// Timestamp of the ingestion run
    pub created_at: String,
}

impl ChunkRecord {
    #[inline]
    pub fn from_chunk(chunk: &TextChunk, vector: Vec<f32>, created_at: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            vector,
            source: chunk.source.display().to_string(),
            page: chunk.page,
            chunk_index: u32::try_from(chunk.chunk_index).unwrap_or(u32::MAX),
            content: chunk.content.clone(),
            created_at: created_at.to_string(),
        }
    }
}

// Database module
// LanceDB holds the chunk vectors, a TOML manifest records how they were built

pub mod lancedb;
pub mod manifest;

pub use lancedb::ChunkRecord;
pub use lancedb::vector_store::{SearchResult, VectorStore};
pub use manifest::IndexManifest;

// Ingestion module
// Turns the files of an input directory into documents ready for chunking

pub mod loader;

use std::path::PathBuf;

pub use loader::{SourceKind, load_directory, load_file};

/// Raw text of one loaded source, immutable once loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path of the file this text came from
    pub source: PathBuf,
    /// Extracted text
    pub content: String,
    /// 0-based page number for PDF pages, `None` for plain text
    pub page: Option<u32>,
}

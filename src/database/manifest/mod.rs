
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::DocsError;
use crate::config::Config;

/// Describes how the stored index was built.
///
/// Written at the end of every ingestion and checked before every query so a
/// question is never embedded with a different model than the chunks were.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub embedding_model: String,
    pub embedding_dimension: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub document_count: usize,
    pub chunk_count: usize,
    pub created_at: String,
}

impl IndexManifest {
    #[inline]
    pub fn new(
        config: &Config,
        embedding_model: &str,
        embedding_dimension: usize,
        document_count: usize,
        chunk_count: usize,
    ) -> Self {
        Self {
            embedding_model: embedding_model.to_string(),
            embedding_dimension,
            chunk_size: config.chunking.chunk_size,
            chunk_overlap: config.chunking.chunk_overlap,
            document_count,
            chunk_count,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Read the manifest; a missing file means no index has been built there
    #[inline]
    pub fn load(path: &Path) -> Result<Self, DocsError> {
        if !path.exists() {
            return Err(DocsError::IndexNotFound(
                path.parent().unwrap_or(path).display().to_string(),
            ));
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            DocsError::Database(format!(
                "Failed to parse index manifest {}: {}",
                path.display(),
                e
            ))
        })
    }

    #[inline]
    pub fn save(&self, path: &Path) -> Result<(), DocsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| DocsError::Database(format!("Failed to serialize manifest: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Fail unless the index was built with `model`
    #[inline]
    pub fn ensure_model(&self, model: &str) -> Result<(), DocsError> {
        if self.embedding_model == model {
            Ok(())
        } else {
            Err(DocsError::ModelMismatch {
                indexed: self.embedding_model.clone(),
                configured: model.to_string(),
            })
        }
    }
}


use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::Document;

/// File types the loader knows how to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Pdf,
    Text,
}

impl SourceKind {
    /// Detect the kind from the file extension, ignoring case
    #[inline]
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        if extension.eq_ignore_ascii_case("pdf") {
            Some(Self::Pdf)
        } else if extension.eq_ignore_ascii_case("txt") {
            Some(Self::Text)
        } else {
            None
        }
    }
}

/// Load every supported file directly inside `dir`, in file name order.
///
/// Subdirectories and unsupported file types are skipped.
#[inline]
pub fn load_directory(dir: &Path) -> Result<Vec<Document>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read documents directory: {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        let path = entry.path();
        if path.is_dir() {
            debug!("Skipping subdirectory {}", path.display());
            continue;
        }
        paths.push(path);
    }
    paths.sort();

    let mut documents = Vec::new();
    let mut files_loaded = 0;
    for path in &paths {
        let loaded = load_file(path)?;
        if !loaded.is_empty() {
            files_loaded += 1;
        }
        documents.extend(loaded);
    }

    info!(
        "Loaded {} documents from {} files in {}",
        documents.len(),
        files_loaded,
        dir.display()
    );

    Ok(documents)
}

/// Load a single file. Returns no documents for unsupported file types.
#[inline]
pub fn load_file(path: &Path) -> Result<Vec<Document>> {
    match SourceKind::from_path(path) {
        Some(SourceKind::Pdf) => load_pdf(path),
        Some(SourceKind::Text) => load_text(path).map(|doc| vec![doc]),
        None => {
            debug!("Skipping unsupported file {}", path.display());
            Ok(Vec::new())
        }
    }
}

fn load_text(path: &Path) -> Result<Document> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read text file: {}", path.display()))?;

    debug!("Loaded {} ({} bytes)", path.display(), content.len());

    Ok(Document {
        source: path.to_path_buf(),
        content,
        page: None,
    })
}

/// Extract a PDF page by page, one document per page
fn load_pdf(path: &Path) -> Result<Vec<Document>> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read PDF file: {}", path.display()))?;

    let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
        .with_context(|| format!("Failed to extract text from PDF: {}", path.display()))?;

    debug!("Extracted {} pages from {}", pages.len(), path.display());

    pages
        .into_iter()
        .enumerate()
        .map(|(page, content)| {
            Ok(Document {
                source: path.to_path_buf(),
                content,
                page: Some(u32::try_from(page).context("PDF has too many pages")?),
            })
        })
        .collect()
}

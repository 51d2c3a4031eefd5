use super::*;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Counts letters into a fixed number of buckets
struct LetterEmbedder {
    calls: AtomicUsize,
}

impl LetterEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; 8];
        for c in text.chars().filter(char::is_ascii_alphabetic) {
            let bucket = (c.to_ascii_lowercase() as usize) % 8;
            vector[bucket] += 1.0;
        }
        vector
    }
}

impl Embedder for LetterEmbedder {
    fn model_name(&self) -> &str {
        "letter-test"
    }

    fn embed_documents(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(Self::vector(text))
    }
}

struct RaggedEmbedder;

impl Embedder for RaggedEmbedder {
    fn model_name(&self) -> &str {
        "ragged"
    }

    fn embed_documents(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .enumerate()
            .map(|(i, _)| vec![1.0; 4 + i])
            .collect())
    }

    fn embed_query(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(vec![1.0; 4])
    }
}

struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn model_name(&self) -> &str {
        "failing"
    }

    fn embed_documents(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Err(anyhow::anyhow!("connection refused"))
    }

    fn embed_query(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        Err(anyhow::anyhow!("connection refused"))
    }
}

fn create_test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::new(temp_dir.path());
    config.ollama.batch_size = 2;
    config.ollama.embedding_dimension = 8;
    config.chunking.chunk_size = 100;
    config.chunking.chunk_overlap = 20;
    config
}

fn document(name: &str, content: &str) -> Document {
    Document {
        source: PathBuf::from(name),
        content: content.to_string(),
        page: None,
    }
}

#[tokio::test]
async fn indexes_documents_and_writes_manifest() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = create_test_config(&temp_dir);
    let indexer = Indexer::new(config.clone());
    let embedder = LetterEmbedder::new();

    let documents = vec![
        document("a.txt", "Alpha paragraph about ownership."),
        document("b.txt", "Beta paragraph about borrowing."),
        document("c.txt", "Gamma paragraph about lifetimes."),
    ];

    let stats = indexer
        .index_documents(&documents, &embedder)
        .await
        .expect("should index documents");

    assert_eq!(stats.documents_loaded, 3);
    assert_eq!(stats.chunks_created, 3);
    assert_eq!(stats.embeddings_generated, 3);
    assert_eq!(stats.embedding_dimension, 8);
    // batch_size 2 over 3 chunks
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);

    let manifest = IndexManifest::load(&config.manifest_path()).expect("should load manifest");
    assert_eq!(manifest.embedding_model, "letter-test");
    assert_eq!(manifest.embedding_dimension, 8);
    assert_eq!(manifest.chunk_count, 3);
    assert_eq!(manifest.chunk_size, 100);

    let store = VectorStore::open_existing(&config.index_path())
        .await
        .expect("index should exist");
    assert_eq!(store.count_chunks().await.expect("should count"), 3);
}

#[tokio::test]
async fn reingestion_overwrites_index() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = create_test_config(&temp_dir);
    let indexer = Indexer::new(config.clone());
    let embedder = LetterEmbedder::new();

    let first = vec![
        document("a.txt", "first run one"),
        document("b.txt", "first run two"),
        document("c.txt", "first run three"),
    ];
    indexer
        .index_documents(&first, &embedder)
        .await
        .expect("first run should succeed");

    let second = vec![document("d.txt", "second run only")];
    let stats = indexer
        .index_documents(&second, &embedder)
        .await
        .expect("second run should succeed");
    assert_eq!(stats.chunks_created, 1);

    let store = VectorStore::open_existing(&config.index_path())
        .await
        .expect("index should exist");
    assert_eq!(store.count_chunks().await.expect("should count"), 1);

    let manifest = IndexManifest::load(&config.manifest_path()).expect("should load manifest");
    assert_eq!(manifest.chunk_count, 1);
    assert_eq!(manifest.document_count, 1);
}

#[tokio::test]
async fn empty_input_creates_empty_index() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = create_test_config(&temp_dir);
    let indexer = Indexer::new(config.clone());

    let stats = indexer
        .index_documents(&[document("blank.txt", "  \n\n  ")], &LetterEmbedder::new())
        .await
        .expect("should index nothing");

    assert_eq!(stats.chunks_created, 0);
    assert_eq!(stats.embedding_dimension, 8);

    let store = VectorStore::open_existing(&config.index_path())
        .await
        .expect("index should exist");
    assert_eq!(store.count_chunks().await.expect("should count"), 0);
    assert_eq!(store.vector_dimension().await.expect("should read dim"), 8);
}

#[tokio::test]
async fn inconsistent_dimensions_are_rejected() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = create_test_config(&temp_dir);
    config.ollama.batch_size = 10;
    let indexer = Indexer::new(config.clone());

    let documents = vec![document("a.txt", "one"), document("b.txt", "two")];
    let result = indexer.index_documents(&documents, &RaggedEmbedder).await;

    assert!(matches!(result, Err(DocsError::Embedding(_))));
    assert!(!config.manifest_path().exists());
}

#[tokio::test]
async fn embedding_failure_keeps_previous_index() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = create_test_config(&temp_dir);
    let indexer = Indexer::new(config.clone());

    indexer
        .index_documents(&[document("a.txt", "kept content")], &LetterEmbedder::new())
        .await
        .expect("first run should succeed");

    let result = indexer
        .index_documents(&[document("b.txt", "lost content")], &FailingEmbedder)
        .await;
    assert!(matches!(result, Err(DocsError::Embedding(_))));

    let store = VectorStore::open_existing(&config.index_path())
        .await
        .expect("index should exist");
    assert_eq!(store.count_chunks().await.expect("should count"), 1);
}

#[tokio::test]
async fn ingest_directory_loads_text_files() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = create_test_config(&temp_dir);
    let docs_dir = temp_dir.path().join("docs");
    fs::create_dir(&docs_dir).expect("should create docs dir");
    fs::write(docs_dir.join("one.txt"), "Tokio is an async runtime.").expect("should write");
    fs::write(docs_dir.join("two.txt"), "Serde serializes data.").expect("should write");
    fs::write(docs_dir.join("skip.md"), "# ignored").expect("should write");

    let stats = Indexer::new(config)
        .ingest_directory(&docs_dir, &LetterEmbedder::new())
        .await
        .expect("should ingest directory");

    assert_eq!(stats.documents_loaded, 2);
    assert_eq!(stats.chunks_created, 2);
}

#[tokio::test]
async fn missing_directory_is_an_ingestion_error() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = create_test_config(&temp_dir);

    let result = Indexer::new(config)
        .ingest_directory(&temp_dir.path().join("nope"), &LetterEmbedder::new())
        .await;

    assert!(matches!(result, Err(DocsError::Ingestion(_))));
}

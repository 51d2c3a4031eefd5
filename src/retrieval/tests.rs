use super::*;
use crate::indexer::Indexer;
use crate::ingestion::Document;
use std::path::PathBuf;
use tempfile::TempDir;

/// Maps known keywords onto fixed axes so distances are predictable
struct KeywordEmbedder {
    name: &'static str,
    dimension: usize,
}

impl KeywordEmbedder {
    const KEYWORDS: [&'static str; 4] = ["cat", "dog", "fish", "bird"];
}

impl Embedder for KeywordEmbedder {
    fn model_name(&self) -> &str {
        self.name
    }

    fn embed_documents(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_query(t)).collect()
    }

    fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let lower = text.to_lowercase();
        let mut vector = vec![0.0; self.dimension];
        for (axis, keyword) in Self::KEYWORDS.iter().enumerate() {
            if let Some(slot) = vector.get_mut(axis) {
                *slot = lower.matches(keyword).count() as f32;
            }
        }
        Ok(vector)
    }
}

fn keyword_embedder() -> Arc<dyn Embedder> {
    Arc::new(KeywordEmbedder {
        name: "keyword-test",
        dimension: 4,
    })
}

async fn build_index(temp_dir: &TempDir) -> Config {
    let mut config = Config::new(temp_dir.path());
    config.ollama.embedding_dimension = 4;

    let documents: Vec<Document> = [
        ("cats.txt", "The cat sat on the mat."),
        ("dogs.txt", "A dog barked at the mailman."),
        ("fish.txt", "Fish swim in the pond."),
        ("birds.txt", "A bird sang at dawn."),
    ]
    .into_iter()
    .map(|(name, content)| Document {
        source: PathBuf::from(name),
        content: content.to_string(),
        page: None,
    })
    .collect();

    Indexer::new(config.clone())
        .index_documents(&documents, keyword_embedder().as_ref())
        .await
        .expect("should build index");

    config
}

#[tokio::test]
async fn nearest_chunk_comes_first() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = build_index(&temp_dir).await;
    let retriever = Retriever::open(&config, keyword_embedder())
        .await
        .expect("should open index");

    let results = retriever
        .retrieve("Where did the dog go?", 4)
        .await
        .expect("should retrieve");

    assert_eq!(results.len(), 4);
    assert_eq!(results[0].source, "dogs.txt");
    assert_eq!(results[0].content, "A dog barked at the mailman.");
    assert!(results[0].distance.abs() < 1e-6);
    assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[tokio::test]
async fn identical_text_round_trips() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = build_index(&temp_dir).await;
    let retriever = Retriever::open(&config, keyword_embedder())
        .await
        .expect("should open index");

    let results = retriever
        .retrieve("Fish swim in the pond.", 1)
        .await
        .expect("should retrieve");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].content, "Fish swim in the pond.");
}

#[tokio::test]
async fn k_bounds_the_result_count() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = build_index(&temp_dir).await;
    let retriever = Retriever::open(&config, keyword_embedder())
        .await
        .expect("should open index");

    for k in [1, 2, 3] {
        let results = retriever.retrieve("cat", k).await.expect("should retrieve");
        assert_eq!(results.len(), k);
    }

    let results = retriever.retrieve("cat", 50).await.expect("should retrieve");
    assert_eq!(results.len(), 4);

    let results = retriever.retrieve("cat", 0).await.expect("should retrieve");
    assert!(results.is_empty());
}

#[tokio::test]
async fn missing_index_is_reported() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = Config::new(temp_dir.path());

    let result = Retriever::open(&config, keyword_embedder()).await;
    assert!(matches!(result, Err(DocsError::IndexNotFound(_))));
}

#[tokio::test]
async fn different_embedding_model_is_refused() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = build_index(&temp_dir).await;

    let other: Arc<dyn Embedder> = Arc::new(KeywordEmbedder {
        name: "another-model",
        dimension: 4,
    });

    let result = Retriever::open(&config, other).await;
    assert!(matches!(result, Err(DocsError::ModelMismatch { .. })));
}

#[tokio::test]
async fn query_dimension_must_match_index() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = build_index(&temp_dir).await;

    let wider: Arc<dyn Embedder> = Arc::new(KeywordEmbedder {
        name: "keyword-test",
        dimension: 6,
    });

    let retriever = Retriever::open(&config, wider)
        .await
        .expect("should open index");
    assert_eq!(retriever.manifest().embedding_dimension, 4);

    let result = retriever.retrieve("cat", 2).await;
    assert!(matches!(result, Err(DocsError::Embedding(_))));
}

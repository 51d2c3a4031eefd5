#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Full pipeline against a mock Ollama server

use docs_rag::commands::{ingest, open_engine};
use docs_rag::config::Config;
use docs_rag::database::IndexManifest;
use serde::Deserialize;
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const EMBEDDING_MODEL: &str = "all-minilm:latest";
const GENERATION_MODEL: &str = "ministral-3";

#[derive(Deserialize)]
struct EmbedBody {
    input: Vec<String>,
}

/// Embeds each input by its vowel counts
struct VowelEmbeddings;

impl Respond for VowelEmbeddings {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let Ok(body) = request.body_json::<EmbedBody>() else {
            return ResponseTemplate::new(400);
        };

        let embeddings: Vec<Vec<f32>> = body
            .input
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                "aeiou"
                    .chars()
                    .map(|v| lower.chars().filter(|c| *c == v).count() as f32)
                    .collect()
            })
            .collect();

        ResponseTemplate::new(200)
            .set_body_json(json!({"model": EMBEDDING_MODEL, "embeddings": embeddings}))
    }
}

async fn start_ollama() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(json!({"model": EMBEDDING_MODEL})))
        .respond_with(VowelEmbeddings)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": GENERATION_MODEL,
            "stream": false,
            "options": {"temperature": 0.0}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": GENERATION_MODEL,
            "response": "The sky is blue.",
            "done": true
        })))
        .mount(&server)
        .await;

    server
}

fn config_for(server: &MockServer, temp_dir: &TempDir) -> Config {
    let mut config = Config::new(temp_dir.path().join("base"));
    config.ollama.host = server.address().ip().to_string();
    config.ollama.port = server.address().port();
    config.ollama.embedding_dimension = 5;
    config.ollama.batch_size = 2;
    config
}

fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init()
        .ok();
}

#[tokio::test(flavor = "multi_thread")]
async fn ingest_and_ask_through_ollama() {
    init_test_tracing();

    let server = start_ollama().await;
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = config_for(&server, &temp_dir);

    let docs = temp_dir.path().join("docs");
    fs::create_dir_all(&docs).expect("should create docs dir");
    fs::write(docs.join("a.txt"), "The sky is blue on a clear day.").expect("should write");
    fs::write(docs.join("b.txt"), "Grass grows quickly in spring.").expect("should write");
    fs::write(docs.join("c.txt"), "Owls hunt at night.").expect("should write");

    let stats = ingest(&config, Some(docs)).await.expect("should ingest");
    assert_eq!(stats.chunks_created, 3);
    assert_eq!(stats.embedding_dimension, 5);

    let manifest = IndexManifest::load(&config.manifest_path()).expect("should load manifest");
    assert_eq!(manifest.embedding_model, EMBEDDING_MODEL);

    let engine = open_engine(&config).await.expect("should open engine");
    let answer = engine
        .answer("What colour is the sky?", Some(2))
        .await
        .expect("should answer");

    assert_eq!(answer.text, "The sky is blue.");
    assert_eq!(answer.sources.len(), 2);

    let requests = server
        .received_requests()
        .await
        .expect("request recording is enabled");
    let generate = requests
        .iter()
        .find(|r| r.url.path() == "/api/generate")
        .expect("generate should be called");
    let body: serde_json::Value = generate.body_json().expect("body should be json");
    let prompt = body["prompt"].as_str().expect("prompt should be a string");
    assert!(prompt.contains("Answer the question using ONLY the context below."));
    assert!(prompt.contains("Question:\nWhat colour is the sky?\n"));
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_ollama_fails_ingest() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = Config::new(temp_dir.path().join("base"));
    config.ollama.host = "127.0.0.1".to_string();
    config.ollama.port = 9;
    config.ollama.timeout_seconds = 2;

    let docs = temp_dir.path().join("docs");
    fs::create_dir_all(&docs).expect("should create docs dir");
    fs::write(docs.join("a.txt"), "some text").expect("should write");

    let result = ingest(&config, Some(docs)).await;
    assert!(result.is_err());
    assert!(!config.manifest_path().exists());
}

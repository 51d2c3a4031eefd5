use super::*;

#[test]
fn non_empty_validator() {
    assert!(non_empty(&"all-minilm".to_string()).is_ok());
    assert!(non_empty(&String::new()).is_err());
    assert!(non_empty(&"   ".to_string()).is_err());
}

#[test]
fn connection_test_fails_for_unreachable_server() {
    let ollama = OllamaConfig {
        host: "127.0.0.1".to_string(),
        port: 9,
        ..OllamaConfig::default()
    };
    assert!(!test_ollama_connection(&ollama));
}

#[test]
fn show_config_prints_defaults() {
    let config = Config::new(std::env::temp_dir().join("docs-rag-show"));
    assert!(show_config(&config).is_ok());
}

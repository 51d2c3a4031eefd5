// Configuration management module
// Handles the TOML configuration shared by ingestion and query

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    Config, ConfigError, IngestionConfig, OllamaConfig, RetrievalConfig,
    DEFAULT_EMBEDDING_DIMENSION, DEFAULT_EMBEDDING_MODEL, DEFAULT_GENERATION_MODEL,
};

/// Resolve the base directory, falling back to `~/.docs-rag`
#[inline]
pub fn resolve_base_dir(
    base_dir: Option<std::path::PathBuf>,
) -> Result<std::path::PathBuf, ConfigError> {
    base_dir.map_or_else(Config::default_base_dir, Ok)
}

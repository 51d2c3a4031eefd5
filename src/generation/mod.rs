// Generation module
// Grounded prompt construction and the language model seam


pub mod prompt;

use anyhow::Result;
use tracing::debug;

use crate::DocsError;

pub use prompt::{NOT_FOUND_SENTINEL, PROMPT_TEMPLATE, build_context, build_prompt};

/// A language model that completes a prompt.
///
/// Implementations must decode deterministically (temperature 0) and return
/// the full, unstreamed output.
pub trait TextGenerator: Send + Sync {
    fn model_name(&self) -> &str;

    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Answers a question from retrieved chunk texts
pub struct AnswerSynthesizer<'a> {
    generator: &'a dyn TextGenerator,
}

impl<'a> AnswerSynthesizer<'a> {
    #[inline]
    pub fn new(generator: &'a dyn TextGenerator) -> Self {
        Self { generator }
    }

    /// Build the grounded prompt and return the model output verbatim
    #[inline]
    pub fn synthesize<S: AsRef<str>>(&self, question: &str, chunks: &[S]) -> crate::Result<String> {
        let prompt = build_prompt(question, chunks);

        debug!(
            "Generating answer with {} from {} chunks",
            self.generator.model_name(),
            chunks.len()
        );

        self.generator
            .generate(&prompt)
            .map_err(|e| DocsError::Generation(format!("{:#}", e)))
    }
}

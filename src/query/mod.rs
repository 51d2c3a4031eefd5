// Query module
// Retrieval followed by grounded generation


use std::sync::Arc;

use tracing::info;

use crate::Result;
use crate::config::Config;
use crate::embeddings::Embedder;
use crate::generation::{AnswerSynthesizer, TextGenerator};
use crate::retrieval::{RetrievedChunk, Retriever};

/// The model output and the chunks it was conditioned on
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<RetrievedChunk>,
}

pub struct QueryEngine {
    retriever: Retriever,
    generator: Arc<dyn TextGenerator>,
    default_k: usize,
}

impl QueryEngine {
    #[inline]
    pub async fn open(
        config: &Config,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
    ) -> Result<Self> {
        let retriever = Retriever::open(config, embedder).await?;

        Ok(Self {
            retriever,
            generator,
            default_k: config.retrieval.top_k,
        })
    }

    /// Answer `question` from the `k` nearest chunks, or the configured `top_k`
    #[inline]
    pub async fn answer(&self, question: &str, k: Option<usize>) -> Result<Answer> {
        let k = k.unwrap_or(self.default_k);
        let sources = self.retriever.retrieve(question, k).await?;

        info!("Answering from {} retrieved chunks", sources.len());

        let texts: Vec<&str> = sources.iter().map(|c| c.content.as_str()).collect();
        let text = AnswerSynthesizer::new(self.generator.as_ref()).synthesize(question, &texts)?;

        Ok(Answer { text, sources })
    }
}

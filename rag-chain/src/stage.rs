//! Named pipeline stages.
//!
//! Each stage owns exactly one collaborator, so it can be exercised alone with
//! a stub in place of the remote call.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use rag_store::{RagError, RetrievalResult, Retriever};
use tracing::{debug, error};

use crate::{
    error::ChainError,
    llm::GenerationProvider,
    prompt::{PromptTemplate, context_block},
};

/// One step of the chain: `I -> Result<O, ChainError>`.
pub trait Stage<I, O>: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, input: I) -> BoxFuture<'_, Result<O, ChainError>>;
}

/// Fetches context for the question.
pub struct RetrieveStage {
    retriever: Arc<Retriever>,
    timeout: Duration,
}

impl RetrieveStage {
    pub fn new(retriever: Arc<Retriever>, timeout: Duration) -> Self {
        Self { retriever, timeout }
    }
}

impl Stage<String, RetrievalResult> for RetrieveStage {
    fn name(&self) -> &'static str {
        "retrieve"
    }

    fn run(&self, question: String) -> BoxFuture<'_, Result<RetrievalResult, ChainError>> {
        Box::pin(async move {
            match tokio::time::timeout(self.timeout, self.retriever.fetch(&question)).await {
                Ok(Ok(units)) => {
                    debug!(units = units.len(), "context retrieved");
                    Ok(units)
                }
                Ok(Err(e)) => {
                    error!(error = %e, "retrieval failed");
                    Err(ChainError::RetrievalUnavailable(e))
                }
                Err(_) => {
                    error!(timeout_ms = self.timeout.as_millis() as u64, "retrieval timed out");
                    Err(ChainError::RetrievalUnavailable(RagError::RetrievalUnavailable(
                        format!("timed out after {:?}", self.timeout),
                    )))
                }
            }
        })
    }
}

/// Input to [`PromptStage`].
#[derive(Debug, Clone)]
pub struct PromptInput {
    pub question: String,
    pub context: RetrievalResult,
}

/// Renders the configured template. Pure and deterministic.
pub struct PromptStage {
    template: &'static PromptTemplate,
}

impl PromptStage {
    pub fn new(template: &'static PromptTemplate) -> Self {
        Self { template }
    }

    pub fn render(&self, input: &PromptInput) -> String {
        self.template
            .render(&context_block(&input.context), &input.question)
    }
}

impl Stage<PromptInput, String> for PromptStage {
    fn name(&self) -> &'static str {
        "prompt"
    }

    fn run(&self, input: PromptInput) -> BoxFuture<'_, Result<String, ChainError>> {
        let prompt = self.render(&input);
        Box::pin(async move { Ok(prompt) })
    }
}

/// Calls the generation provider with the assembled prompt.
pub struct GenerateStage {
    generator: Arc<dyn GenerationProvider>,
    timeout: Duration,
}

impl GenerateStage {
    pub fn new(generator: Arc<dyn GenerationProvider>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }
}

impl Stage<String, String> for GenerateStage {
    fn name(&self) -> &'static str {
        "generate"
    }

    fn run(&self, prompt: String) -> BoxFuture<'_, Result<String, ChainError>> {
        Box::pin(async move {
            let answer = tokio::time::timeout(self.timeout, self.generator.generate(&prompt))
                .await
                .map_err(|_| {
                    ChainError::GenerationFailure(format!("timed out after {:?}", self.timeout))
                })??;

            if answer.trim().is_empty() {
                return Err(ChainError::GenerationFailure(format!(
                    "{} returned an empty response",
                    self.generator.name()
                )));
            }
            Ok(answer)
        })
    }
}

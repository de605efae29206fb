//! Per-query RAG orchestration.
//!
//! Public API: [`RagChain::answer`]. The chain runs three named stages
//! strictly in sequence:
//!
//! `Received → Retrieving → PromptAssembled → Generating → Completed`
//!
//! Retrieval or generation failures end in `Failed`. A failed retrieval never
//! reaches the generation provider.

pub mod cfg;
mod error;
pub mod llm;
pub mod prompt;
pub mod stage;

use std::{fmt, sync::Arc};

use rag_store::Retriever;
use tracing::{debug, info, instrument};

pub use cfg::ChainConfig;
pub use error::ChainError;
pub use llm::{GenerationProvider, ProfilesGenerator};
pub use stage::{GenerateStage, PromptInput, PromptStage, RetrieveStage, Stage};

/// Lifecycle of one `answer` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    Received,
    Retrieving,
    PromptAssembled,
    Generating,
    Completed,
    Failed,
}

impl fmt::Display for ChainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChainState::Received => "RECEIVED",
            ChainState::Retrieving => "RETRIEVING",
            ChainState::PromptAssembled => "PROMPT_ASSEMBLED",
            ChainState::Generating => "GENERATING",
            ChainState::Completed => "COMPLETED",
            ChainState::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Visited states plus the outcome.
#[derive(Debug)]
pub struct ChainRun {
    pub states: Vec<ChainState>,
    pub result: Result<String, ChainError>,
}

/// Retrieve → prompt → generate.
///
/// Holds only read-only shared bindings; one instance serves concurrent queries.
pub struct RagChain {
    retrieve: RetrieveStage,
    prompt: PromptStage,
    generate: GenerateStage,
}

impl RagChain {
    /// # Errors
    /// [`ChainError::Config`] for an unknown template name or zero timeouts.
    pub fn new(
        cfg: ChainConfig,
        retriever: Arc<Retriever>,
        generator: Arc<dyn GenerationProvider>,
    ) -> Result<Self, ChainError> {
        cfg.validate()?;
        let template = prompt::lookup(&cfg.prompt)
            .ok_or_else(|| ChainError::Config(format!("unknown prompt template `{}`", cfg.prompt)))?;

        info!(prompt = template.name, top_k = retriever.top_k(), "RagChain ready");
        Ok(Self {
            retrieve: RetrieveStage::new(retriever, cfg.retrieval_timeout),
            prompt: PromptStage::new(template),
            generate: GenerateStage::new(generator, cfg.generation_timeout),
        })
    }

    /// Answers one stateless question.
    ///
    /// The generated text is returned as is.
    pub async fn answer(&self, query: &str) -> Result<String, ChainError> {
        self.answer_traced(query).await.result
    }

    /// Like [`RagChain::answer`] but also reports the visited states.
    #[instrument(skip_all, fields(query_len = query.len()))]
    pub async fn answer_traced(&self, query: &str) -> ChainRun {
        let mut states = Vec::with_capacity(5);
        let mut enter = |s: ChainState| {
            debug!(state = %s, "chain state");
            states.push(s);
        };

        enter(ChainState::Received);

        enter(ChainState::Retrieving);
        let context = match self.retrieve.run(query.to_string()).await {
            Ok(units) => units,
            Err(e) => {
                enter(ChainState::Failed);
                return ChainRun {
                    states,
                    result: Err(e),
                };
            }
        };

        let prompt = match self
            .prompt
            .run(PromptInput {
                question: query.to_string(),
                context,
            })
            .await
        {
            Ok(p) => p,
            Err(e) => {
                enter(ChainState::Failed);
                return ChainRun {
                    states,
                    result: Err(e),
                };
            }
        };
        enter(ChainState::PromptAssembled);

        enter(ChainState::Generating);
        let result = self.generate.run(prompt).await;
        enter(if result.is_ok() {
            ChainState::Completed
        } else {
            ChainState::Failed
        });

        ChainRun { states, result }
    }
}

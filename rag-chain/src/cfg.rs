//! Chain configuration.

use std::time::Duration;

use crate::{error::ChainError, prompt};

#[derive(Clone, Debug, PartialEq)]
pub struct ChainConfig {
    /// Registered template name, see [`prompt::lookup`].
    pub prompt: String,
    /// Upper bound for embed + search.
    pub retrieval_timeout: Duration,
    /// Upper bound for the generation call.
    pub generation_timeout: Duration,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            prompt: prompt::PRODUCT_BOT.to_string(),
            retrieval_timeout: Duration::from_secs(20),
            generation_timeout: Duration::from_secs(60),
        }
    }
}

impl ChainConfig {
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.retrieval_timeout.is_zero() {
            return Err(ChainError::Config("retrieval_timeout must be > 0".into()));
        }
        if self.generation_timeout.is_zero() {
            return Err(ChainError::Config("generation_timeout must be > 0".into()));
        }
        if prompt::lookup(&self.prompt).is_none() {
            let known: Vec<_> = prompt::names().collect();
            return Err(ChainError::Config(format!(
                "unknown prompt template `{}` (known: {})",
                self.prompt,
                known.join(", ")
            )));
        }
        Ok(())
    }
}

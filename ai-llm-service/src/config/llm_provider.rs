use std::fmt;

use crate::error_handler::Provider;

/// Remote backend serving a model profile.
///
/// - `Gemini`: Google Generative Language API (embeddings and generation)
/// - `Groq`: OpenAI-compatible chat completions (generation only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    Gemini,
    Groq,
}

impl LlmProvider {
    /// Whether this backend exposes an embeddings API.
    pub fn supports_embeddings(self) -> bool {
        matches!(self, LlmProvider::Gemini)
    }
}

impl From<LlmProvider> for Provider {
    fn from(p: LlmProvider) -> Self {
        match p {
            LlmProvider::Gemini => Provider::Gemini,
            LlmProvider::Groq => Provider::Groq,
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Provider::from(*self), f)
    }
}

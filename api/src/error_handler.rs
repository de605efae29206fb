use axum::{
    extract::rejection::FormRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rag_chain::ChainError;
use thiserror::Error;
use tracing::error;

use crate::core::http::response_envelope::ApiResponse;

/// Shown to chat users whenever answering fails. Details stay in the logs.
pub const CHAT_FAILURE_MESSAGE: &str =
    "Sorry, I couldn't answer that right now. Please try again in a moment.";

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    // --- Chain ---
    #[error("chat failed: {0}")]
    Chat(#[from] ChainError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Chat(_) => StatusCode::BAD_GATEWAY,
            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Chat(ChainError::RetrievalUnavailable(_)) => "RETRIEVAL_UNAVAILABLE",
            AppError::Chat(ChainError::GenerationFailure(_)) => "GENERATION_FAILURE",
            AppError::Chat(ChainError::Config(_)) => "CHAIN_CONFIG",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            // The chat page renders the body as the bot reply.
            AppError::Chat(e) => {
                error!(code = self.error_code(), error = %e, "chat request failed");
                (status, CHAT_FAILURE_MESSAGE).into_response()
            }
            _ => ApiResponse::failure(status, self.error_code(), self.to_string()),
        }
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<FormRejection> for AppError {
    fn from(err: FormRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

//! POST /get — answers one chat message.

use std::sync::Arc;

use axum::{
    Form,
    extract::{State, rejection::FormRejection},
};
use serde::Deserialize;
use tracing::info;

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
};

/// Form body sent by the chat page.
#[derive(Debug, Deserialize)]
pub struct ChatForm {
    pub msg: String,
}

/// Handler: POST /get
///
/// Returns the generated answer as `text/plain`, unmodified.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8000/get \
///   --data-urlencode 'msg=Can you tell me the low budget headphone?'
/// ```
pub async fn chat(
    State(state): State<Arc<AppState>>,
    form: Result<Form<ChatForm>, FormRejection>,
) -> AppResult<String> {
    let Form(ChatForm { msg }) = form?;
    if msg.trim().is_empty() {
        return Err(AppError::BadRequest("msg must not be empty".into()));
    }

    info!(len = msg.len(), "chat message received");
    let answer = state.chain.answer(&msg).await?;
    Ok(answer)
}

//! GET / — the chat page.

use axum::response::Html;

const CHAT_PAGE: &str = include_str!("../../assets/chat.html");

pub async fn index() -> Html<&'static str> {
    Html(CHAT_PAGE)
}

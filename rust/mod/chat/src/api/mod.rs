mod chat;

use std::sync::Arc;

use axum::Router;

use crate::service::ChatService;

/// Shared application state.
pub type AppState = Arc<ChatService>;

/// Build the chat API router, nested under `/chat`.
pub fn build_router(svc: Arc<ChatService>) -> Router {
    Router::new().merge(chat::routes()).with_state(svc)
}

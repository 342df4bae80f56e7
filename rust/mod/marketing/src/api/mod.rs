mod marketing;

use std::sync::Arc;

use axum::Router;

use crate::service::MarketingService;

/// Shared application state.
pub type AppState = Arc<MarketingService>;

/// Build the marketing API router, nested under `/marketing`.
pub fn build_router(svc: Arc<MarketingService>) -> Router {
    Router::new().merge(marketing::routes()).with_state(svc)
}

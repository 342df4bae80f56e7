mod training;

use std::sync::Arc;

use axum::Router;

use crate::service::TrainingService;

/// Shared application state.
pub type AppState = Arc<TrainingService>;

/// Build the training API router, nested under `/training`.
pub fn build_router(svc: Arc<TrainingService>) -> Router {
    Router::new().merge(training::routes()).with_state(svc)
}

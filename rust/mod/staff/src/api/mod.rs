mod staff;

use std::sync::Arc;

use axum::Router;

use crate::service::StaffService;

/// Shared application state.
pub type AppState = Arc<StaffService>;

/// Build the staff API router. Routes are relative; the server nests them
/// under `/staff`.
pub fn build_router(svc: Arc<StaffService>) -> Router {
    Router::new().merge(staff::routes()).with_state(svc)
}

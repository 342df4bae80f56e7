mod attendance;
mod contracts;
mod payroll;

use std::sync::Arc;

use axum::Router;

use crate::service::HrService;

/// Shared application state.
pub type AppState = Arc<HrService>;

/// Build the hr API router. Routes are relative; the server nests them
/// under `/hr`.
pub fn build_router(svc: Arc<HrService>) -> Router {
    Router::new()
        .merge(contracts::routes())
        .merge(attendance::routes())
        .merge(payroll::routes())
        .with_state(svc)
}

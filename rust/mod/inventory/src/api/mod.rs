mod inventory;

use std::sync::Arc;

use axum::Router;

use crate::service::InventoryService;

/// Shared application state.
pub type AppState = Arc<InventoryService>;

/// Build the inventory API router, nested under `/inventory`.
pub fn build_router(svc: Arc<InventoryService>) -> Router {
    Router::new().merge(inventory::routes()).with_state(svc)
}

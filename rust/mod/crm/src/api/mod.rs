mod bookings;
mod customers;
mod sales;
mod telesales;

use std::sync::Arc;

use axum::Router;

use crate::service::CrmService;

/// Shared application state.
pub type AppState = Arc<CrmService>;

/// Build the crm API router. Routes are relative; the server nests them
/// under `/crm`.
pub fn build_router(svc: Arc<CrmService>) -> Router {
    Router::new()
        .merge(customers::routes())
        .merge(telesales::routes())
        .merge(bookings::routes())
        .merge(sales::routes())
        .with_state(svc)
}

//! Inventory module: product catalogue, stock movements and low-stock alerts.

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use clinic_core::{Module, ServiceError};
use clinic_sql::SQLStore;

use crate::service::InventoryService;

/// Inventory module implementing the Module trait.
pub struct InventoryModule {
    service: Arc<InventoryService>,
}

impl InventoryModule {
    pub fn new(sql: Arc<dyn SQLStore>) -> Result<Self, ServiceError> {
        Ok(Self {
            service: InventoryService::new(sql)?,
        })
    }

    pub fn service(&self) -> &Arc<InventoryService> {
        &self.service
    }
}

impl Module for InventoryModule {
    fn name(&self) -> &str {
        "inventory"
    }

    fn routes(&self) -> Router {
        api::build_router(self.service.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use clinic_core::{Principal, Role};
    use clinic_sql::SqliteStore;
    use tower::ServiceExt;

    fn post(uri: &str, body: serde_json::Value, role: Role) -> Request<Body> {
        let mut req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        req.extensions_mut().insert(Principal {
            staff_id: "w1".into(),
            name: "W1".into(),
            role,
            team: None,
        });
        req
    }

    #[tokio::test]
    async fn export_beyond_stock_is_bad_request() {
        let module = InventoryModule::new(Arc::new(SqliteStore::open_in_memory().unwrap())).unwrap();
        let app = module.routes();

        let resp = app
            .clone()
            .oneshot(post("/products", serde_json::json!({"sku": "a1", "name": "Cotton pads"}), Role::Warehouse))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        let product: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        let movement = serde_json::json!({"productId": product["id"], "kind": "EXPORT", "quantity": 1});
        let resp = app.oneshot(post("/movements", movement, Role::Warehouse)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

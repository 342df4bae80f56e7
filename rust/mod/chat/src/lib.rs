//! Chat module: group and direct rooms with long-poll delivery.

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use clinic_core::{Module, ServiceError};
use clinic_sql::SQLStore;

use crate::service::ChatService;

/// Chat module implementing the Module trait.
pub struct ChatModule {
    service: Arc<ChatService>,
}

impl ChatModule {
    pub fn new(sql: Arc<dyn SQLStore>) -> Result<Self, ServiceError> {
        Ok(Self {
            service: ChatService::new(sql)?,
        })
    }

    pub fn service(&self) -> &Arc<ChatService> {
        &self.service
    }
}

impl Module for ChatModule {
    fn name(&self) -> &str {
        "chat"
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

    fn request(method: &str, uri: &str, body: Option<serde_json::Value>, staff: &str) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        let mut req = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        req.extensions_mut().insert(Principal {
            staff_id: staff.into(),
            name: staff.to_uppercase(),
            role: Role::Receptionist,
            team: None,
        });
        req
    }

    async fn json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn direct_chat_over_http() {
        let module = ChatModule::new(Arc::new(SqliteStore::open_in_memory().unwrap())).unwrap();
        let app = module.routes();

        let resp = app
            .clone()
            .oneshot(request("POST", "/direct", Some(serde_json::json!({"staffId": "b"})), "a"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let room = json(resp).await;
        let room_id = room["id"].as_str().unwrap().to_string();

        let resp = app
            .clone()
            .oneshot(request(
                "POST",
                &format!("/rooms/{room_id}/messages"),
                Some(serde_json::json!({"body": "lunch?"})),
                "a",
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = app
            .clone()
            .oneshot(request("GET", &format!("/rooms/{room_id}/poll?after=0&timeout=1"), None, "b"))
            .await
            .unwrap();
        let got = json(resp).await;
        assert_eq!(got[0]["body"], "lunch?");

        let resp = app
            .oneshot(request("GET", &format!("/rooms/{room_id}/messages"), None, "c"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

//! Training module: product documents, question bank and staff quizzes.

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use clinic_core::{Module, ServiceError};
use clinic_sql::SQLStore;

use crate::service::TrainingService;

/// Training module implementing the Module trait.
pub struct TrainingModule {
    service: Arc<TrainingService>,
}

impl TrainingModule {
    pub fn new(sql: Arc<dyn SQLStore>) -> Result<Self, ServiceError> {
        Ok(Self {
            service: TrainingService::new(sql)?,
        })
    }

    pub fn service(&self) -> &Arc<TrainingService> {
        &self.service
    }
}

impl Module for TrainingModule {
    fn name(&self) -> &str {
        "training"
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

    fn request(method: &str, uri: &str, body: Option<serde_json::Value>, role: Role) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        let mut req = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        req.extensions_mut().insert(Principal {
            staff_id: "s1".into(),
            name: "S1".into(),
            role,
            team: None,
        });
        req
    }

    async fn json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn quiz_round_trip_over_http() {
        let module = TrainingModule::new(Arc::new(SqliteStore::open_in_memory().unwrap())).unwrap();
        let app = module.routes();

        let question = serde_json::json!({"question": "Sunscreen after a peel?", "options": ["No", "Yes"], "correctIndex": 1});
        let resp = app
            .clone()
            .oneshot(request("POST", "/questions", Some(question.clone()), Role::Telesale))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let resp = app.clone().oneshot(request("POST", "/questions", Some(question), Role::Hr)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let quiz = json(app.clone().oneshot(request("GET", "/quiz?count=5", None, Role::Telesale)).await.unwrap()).await;
        assert_eq!(quiz["questions"].as_array().unwrap().len(), 1);
        assert!(quiz["questions"][0].get("correctIndex").is_none());

        let submit = serde_json::json!({
            "quizId": quiz["id"],
            "answers": [{"questionId": quiz["questions"][0]["id"], "choice": 1}]
        });
        let resp = app
            .clone()
            .oneshot(request("POST", "/quiz/submit", Some(submit.clone()), Role::Telesale))
            .await
            .unwrap();
        let result = json(resp).await;
        assert_eq!(result["passed"], true);
        assert_eq!(result["scorePercent"], 100.0);

        let resp = app
            .oneshot(request("POST", "/quiz/submit", Some(submit), Role::Telesale))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}

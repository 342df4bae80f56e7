//! Marketing module: ad campaigns, daily results, summaries and AI copywriting.

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use clinic_core::{Module, ServiceError};
use clinic_sql::SQLStore;

pub use crate::model::AiConfig;
use crate::service::MarketingService;

/// Marketing module implementing the Module trait.
pub struct MarketingModule {
    service: Arc<MarketingService>,
}

impl MarketingModule {
    pub fn new(sql: Arc<dyn SQLStore>, ai: AiConfig) -> Result<Self, ServiceError> {
        Ok(Self {
            service: MarketingService::new(sql, ai)?,
        })
    }

    pub fn service(&self) -> &Arc<MarketingService> {
        &self.service
    }
}

impl Module for MarketingModule {
    fn name(&self) -> &str {
        "marketing"
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

    fn request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        let mut req = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        req.extensions_mut().insert(Principal {
            staff_id: "mk1".into(),
            name: "MK1".into(),
            role: Role::Marketing,
            team: None,
        });
        req
    }

    #[tokio::test]
    async fn duplicate_report_is_conflict() {
        let module = MarketingModule::new(Arc::new(SqliteStore::open_in_memory().unwrap()), AiConfig::default()).unwrap();
        let app = module.routes();

        let resp = app
            .clone()
            .oneshot(request(
                "POST",
                "/campaigns",
                Some(serde_json::json!({"name": "Laser", "platform": "ZALO", "startDate": "2026-04-01", "budget": 500000})),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        let campaign: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        let report = serde_json::json!({"campaignId": campaign["id"], "reportDate": "2026-04-02", "spend": 1000, "leads": 2});
        let resp = app.clone().oneshot(request("POST", "/reports", Some(report.clone()))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let resp = app.clone().oneshot(request("POST", "/reports", Some(report))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = app
            .oneshot(request("GET", "/summary?from=2026-04-01&to=2026-04-30", None))
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        let summary: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(summary["total"]["costPerLead"], 500.0);
        assert_eq!(summary["campaigns"][0]["budgetUsage"], 0.2);
    }
}

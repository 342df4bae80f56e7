use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use clinic_core::{ListResult, Principal, ServiceError};

use crate::api::AppState;
use crate::model::{
    Campaign, CampaignQuery, CreateCampaign, CreateReport, DailyReport, GenerateContent, GeneratedContent,
    MarketingSummary, ReportQuery, SummaryQuery,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/campaigns", get(list_campaigns).post(create_campaign))
        .route(
            "/campaigns/{id}",
            get(get_campaign).patch(update_campaign).delete(delete_campaign),
        )
        .route("/reports", get(list_reports).post(create_report))
        .route("/reports/{id}", axum::routing::patch(update_report).delete(delete_report))
        .route("/summary", get(summary))
        .route("/content", post(generate_content))
}

async fn list_campaigns(
    State(svc): State<AppState>,
    caller: Principal,
    Query(query): Query<CampaignQuery>,
) -> Result<Json<Vec<Campaign>>, ServiceError> {
    Ok(Json(svc.list_campaigns(&caller, &query)?))
}

async fn create_campaign(
    State(svc): State<AppState>,
    caller: Principal,
    Json(input): Json<CreateCampaign>,
) -> Result<(StatusCode, Json<Campaign>), ServiceError> {
    let campaign = svc.create_campaign(&caller, input)?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

async fn get_campaign(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<Json<Campaign>, ServiceError> {
    Ok(Json(svc.get_campaign(&caller, &id)?))
}

async fn update_campaign(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Campaign>, ServiceError> {
    Ok(Json(svc.update_campaign(&caller, &id, patch)?))
}

async fn delete_campaign(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_campaign(&caller, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_reports(
    State(svc): State<AppState>,
    caller: Principal,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ListResult<DailyReport>>, ServiceError> {
    Ok(Json(svc.list_reports(&caller, &query)?))
}

async fn create_report(
    State(svc): State<AppState>,
    caller: Principal,
    Json(input): Json<CreateReport>,
) -> Result<(StatusCode, Json<DailyReport>), ServiceError> {
    let report = svc.create_report(&caller, input)?;
    Ok((StatusCode::CREATED, Json(report)))
}

async fn update_report(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<DailyReport>, ServiceError> {
    Ok(Json(svc.update_report(&caller, &id, patch)?))
}

async fn delete_report(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_report(&caller, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn summary(
    State(svc): State<AppState>,
    caller: Principal,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<MarketingSummary>, ServiceError> {
    Ok(Json(svc.summary(&caller, &query)?))
}

async fn generate_content(
    State(svc): State<AppState>,
    caller: Principal,
    Json(input): Json<GenerateContent>,
) -> Result<Json<GeneratedContent>, ServiceError> {
    Ok(Json(svc.generate_content(&caller, input).await?))
}

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use clinic_core::{ListResult, Principal, ServiceError};

use crate::api::AppState;
use crate::model::{CallLog, CallQuery, DateRange, LogCall, TelesaleStats};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/calls", get(list_calls).post(log_call))
        .route("/reports/telesales", get(telesale_report))
}

async fn list_calls(
    State(svc): State<AppState>,
    caller: Principal,
    Query(query): Query<CallQuery>,
) -> Result<Json<ListResult<CallLog>>, ServiceError> {
    Ok(Json(svc.list_calls(&caller, &query)?))
}

async fn log_call(
    State(svc): State<AppState>,
    caller: Principal,
    Json(input): Json<LogCall>,
) -> Result<(StatusCode, Json<CallLog>), ServiceError> {
    let log = svc.log_call(&caller, input)?;
    Ok((StatusCode::CREATED, Json(log)))
}

async fn telesale_report(
    State(svc): State<AppState>,
    caller: Principal,
    Query(range): Query<DateRange>,
) -> Result<Json<Vec<TelesaleStats>>, ServiceError> {
    Ok(Json(svc.telesale_report(&caller, range)?))
}

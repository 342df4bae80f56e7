use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use clinic_core::{ListResult, Principal, ServiceError};

use crate::api::AppState;
use crate::model::{month_bounds, Attendance, AttendanceCounts, AttendanceQuery, MarkAttendance};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/attendance", get(list_attendance).post(mark_attendance))
        .route("/attendance/check-in", post(check_in))
        .route("/attendance/check-out", post(check_out))
        .route("/attendance/summary/{staff_id}", get(summary))
}

#[derive(Debug, Deserialize)]
struct MonthQuery {
    month: String,
}

async fn list_attendance(
    State(svc): State<AppState>,
    caller: Principal,
    Query(query): Query<AttendanceQuery>,
) -> Result<Json<ListResult<Attendance>>, ServiceError> {
    Ok(Json(svc.list_attendance(&caller, &query)?))
}

async fn mark_attendance(
    State(svc): State<AppState>,
    caller: Principal,
    Json(input): Json<MarkAttendance>,
) -> Result<Json<Attendance>, ServiceError> {
    Ok(Json(svc.mark_attendance(&caller, input)?))
}

async fn check_in(State(svc): State<AppState>, caller: Principal) -> Result<Json<Attendance>, ServiceError> {
    Ok(Json(svc.check_in(&caller)?))
}

async fn check_out(State(svc): State<AppState>, caller: Principal) -> Result<Json<Attendance>, ServiceError> {
    Ok(Json(svc.check_out(&caller)?))
}

async fn summary(
    State(svc): State<AppState>,
    caller: Principal,
    Path(staff_id): Path<String>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<AttendanceCounts>, ServiceError> {
    let (from, to) = month_bounds(&query.month)?;
    Ok(Json(svc.attendance_summary(&caller, &staff_id, from, to)?))
}

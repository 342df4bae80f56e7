use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use clinic_core::{ListResult, Principal, ServiceError};

use crate::api::AppState;
use crate::model::{CreateStaff, SetPassword, Staff, StaffQuery};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_staff).post(create_staff))
        .route("/me", get(me))
        .route("/{id}", get(get_staff).patch(update_staff))
        .route("/{id}/password", put(set_password))
        .route("/{id}/deactivate", post(deactivate_staff))
}

async fn list_staff(
    State(svc): State<AppState>,
    _caller: Principal,
    Query(query): Query<StaffQuery>,
) -> Result<Json<ListResult<Staff>>, ServiceError> {
    Ok(Json(svc.list_staff(&query)?))
}

async fn create_staff(
    State(svc): State<AppState>,
    caller: Principal,
    Json(input): Json<CreateStaff>,
) -> Result<(StatusCode, Json<Staff>), ServiceError> {
    let staff = svc.create_staff(&caller, input)?;
    Ok((StatusCode::CREATED, Json(staff)))
}

async fn me(State(svc): State<AppState>, caller: Principal) -> Result<Json<Staff>, ServiceError> {
    Ok(Json(svc.get_staff(&caller.staff_id)?))
}

async fn get_staff(
    State(svc): State<AppState>,
    _caller: Principal,
    Path(id): Path<String>,
) -> Result<Json<Staff>, ServiceError> {
    Ok(Json(svc.get_staff(&id)?))
}

async fn update_staff(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Staff>, ServiceError> {
    Ok(Json(svc.update_staff(&caller, &id, patch)?))
}

async fn set_password(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
    Json(body): Json<SetPassword>,
) -> Result<StatusCode, ServiceError> {
    svc.set_password(&caller, &id, &body.password)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn deactivate_staff(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<Json<Staff>, ServiceError> {
    Ok(Json(svc.deactivate_staff(&caller, &id)?))
}

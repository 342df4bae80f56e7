use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use clinic_core::{Principal, ServiceError};

use crate::api::AppState;
use crate::model::{ContractQuery, CreateContract, EmployeeContract};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/contracts", get(list_contracts).post(create_contract))
        .route("/contracts/{id}", get(get_contract).patch(update_contract))
        .route("/contracts/{id}/terminate", post(terminate_contract))
}

async fn list_contracts(
    State(svc): State<AppState>,
    caller: Principal,
    Query(query): Query<ContractQuery>,
) -> Result<Json<Vec<EmployeeContract>>, ServiceError> {
    Ok(Json(svc.list_contracts(&caller, &query)?))
}

async fn create_contract(
    State(svc): State<AppState>,
    caller: Principal,
    Json(input): Json<CreateContract>,
) -> Result<(StatusCode, Json<EmployeeContract>), ServiceError> {
    let contract = svc.create_contract(&caller, input)?;
    Ok((StatusCode::CREATED, Json(contract)))
}

async fn get_contract(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<Json<EmployeeContract>, ServiceError> {
    Ok(Json(svc.get_contract(&caller, &id)?))
}

async fn update_contract(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<EmployeeContract>, ServiceError> {
    Ok(Json(svc.update_contract(&caller, &id, patch)?))
}

async fn terminate_contract(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<Json<EmployeeContract>, ServiceError> {
    Ok(Json(svc.terminate_contract(&caller, &id)?))
}

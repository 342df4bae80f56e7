use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use clinic_core::{ListResult, Principal, ServiceError};

use crate::api::AppState;
use crate::model::{CreateCustomer, Customer, CustomerQuery, ImportReport, Reassign};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route("/customers/top", get(top_customers))
        .route("/customers/import", post(import_customers))
        .route(
            "/customers/{id}",
            get(get_customer).patch(update_customer).delete(delete_customer),
        )
        .route("/customers/{id}/reassign", post(reassign_customer))
}

#[derive(Debug, Deserialize)]
struct TopQuery {
    #[serde(default = "default_top")]
    limit: usize,
}

fn default_top() -> usize {
    10
}

async fn list_customers(
    State(svc): State<AppState>,
    caller: Principal,
    Query(query): Query<CustomerQuery>,
) -> Result<Json<ListResult<Customer>>, ServiceError> {
    Ok(Json(svc.list_customers(&caller, &query)?))
}

async fn create_customer(
    State(svc): State<AppState>,
    caller: Principal,
    Json(input): Json<CreateCustomer>,
) -> Result<(StatusCode, Json<Customer>), ServiceError> {
    let customer = svc.create_customer(&caller, input)?;
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn top_customers(
    State(svc): State<AppState>,
    caller: Principal,
    Query(query): Query<TopQuery>,
) -> Result<Json<Vec<Customer>>, ServiceError> {
    Ok(Json(svc.top_customers(&caller, query.limit)?))
}

/// Body is the raw CSV text.
async fn import_customers(
    State(svc): State<AppState>,
    caller: Principal,
    body: String,
) -> Result<Json<ImportReport>, ServiceError> {
    Ok(Json(svc.import_customers(&caller, &body)?))
}

async fn get_customer(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ServiceError> {
    Ok(Json(svc.get_customer(&caller, &id)?))
}

async fn update_customer(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Customer>, ServiceError> {
    Ok(Json(svc.update_customer(&caller, &id, patch)?))
}

async fn delete_customer(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_customer(&caller, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn reassign_customer(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
    Json(body): Json<Reassign>,
) -> Result<Json<Customer>, ServiceError> {
    Ok(Json(svc.reassign_customer(&caller, &id, &body.staff_id)?))
}

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use clinic_core::{ListResult, Principal, ServiceError};

use crate::api::AppState;
use crate::model::{CreateProduct, InventoryLog, LogQuery, Product, ProductQuery, RecordMovement};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/low-stock", get(low_stock))
        .route("/products/{id}", get(get_product).patch(update_product))
        .route("/movements", get(list_logs).post(record_movement))
}

async fn list_products(
    State(svc): State<AppState>,
    _caller: Principal,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ListResult<Product>>, ServiceError> {
    Ok(Json(svc.list_products(&query)?))
}

async fn create_product(
    State(svc): State<AppState>,
    caller: Principal,
    Json(input): Json<CreateProduct>,
) -> Result<(StatusCode, Json<Product>), ServiceError> {
    let product = svc.create_product(&caller, input)?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn low_stock(State(svc): State<AppState>, _caller: Principal) -> Result<Json<Vec<Product>>, ServiceError> {
    Ok(Json(svc.low_stock()?))
}

async fn get_product(
    State(svc): State<AppState>,
    _caller: Principal,
    Path(id): Path<String>,
) -> Result<Json<Product>, ServiceError> {
    Ok(Json(svc.get_product(&id)?))
}

async fn update_product(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Product>, ServiceError> {
    Ok(Json(svc.update_product(&caller, &id, patch)?))
}

async fn list_logs(
    State(svc): State<AppState>,
    _caller: Principal,
    Query(query): Query<LogQuery>,
) -> Result<Json<ListResult<InventoryLog>>, ServiceError> {
    Ok(Json(svc.list_logs(&query)?))
}

async fn record_movement(
    State(svc): State<AppState>,
    caller: Principal,
    Json(input): Json<RecordMovement>,
) -> Result<(StatusCode, Json<InventoryLog>), ServiceError> {
    let log = svc.record_movement(&caller, input)?;
    Ok((StatusCode::CREATED, Json(log)))
}

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use clinic_core::{ListResult, Principal, ServiceError};

use crate::api::AppState;
use crate::model::{
    CreateOrder, CreateService, Dashboard, DateRange, Order, OrderQuery, PayDebt, RevenueReport, Service,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/services", get(list_services).post(create_service))
        .route(
            "/services/{id}",
            get(get_service).patch(update_service).delete(delete_service),
        )
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/{id}", get(get_order).patch(update_order).delete(delete_order))
        .route("/orders/{id}/payments", post(pay_debt))
        .route("/debts", get(debt_list))
        .route("/reports/revenue", get(revenue_report))
        .route("/dashboard", get(dashboard))
}

#[derive(Debug, Default, Deserialize)]
struct ServiceListQuery {
    #[serde(default)]
    all: bool,
}

async fn list_services(
    State(svc): State<AppState>,
    _caller: Principal,
    Query(query): Query<ServiceListQuery>,
) -> Result<Json<Vec<Service>>, ServiceError> {
    Ok(Json(svc.list_services(query.all)?))
}

async fn create_service(
    State(svc): State<AppState>,
    caller: Principal,
    Json(input): Json<CreateService>,
) -> Result<(StatusCode, Json<Service>), ServiceError> {
    let service = svc.create_service(&caller, input)?;
    Ok((StatusCode::CREATED, Json(service)))
}

async fn get_service(
    State(svc): State<AppState>,
    _caller: Principal,
    Path(id): Path<String>,
) -> Result<Json<Service>, ServiceError> {
    Ok(Json(svc.get_service(&id)?))
}

async fn update_service(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Service>, ServiceError> {
    Ok(Json(svc.update_service(&caller, &id, patch)?))
}

async fn delete_service(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_service(&caller, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_orders(
    State(svc): State<AppState>,
    caller: Principal,
    Query(query): Query<OrderQuery>,
) -> Result<Json<ListResult<Order>>, ServiceError> {
    Ok(Json(svc.list_orders(&caller, &query)?))
}

async fn create_order(
    State(svc): State<AppState>,
    caller: Principal,
    Json(input): Json<CreateOrder>,
) -> Result<(StatusCode, Json<Order>), ServiceError> {
    let order = svc.create_order(&caller, input)?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn get_order(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<Json<Order>, ServiceError> {
    Ok(Json(svc.get_order(&caller, &id)?))
}

async fn update_order(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Order>, ServiceError> {
    Ok(Json(svc.update_order(&caller, &id, patch)?))
}

async fn delete_order(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_order(&caller, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn pay_debt(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
    Json(body): Json<PayDebt>,
) -> Result<Json<Order>, ServiceError> {
    Ok(Json(svc.pay_debt(&caller, &id, body.amount)?))
}

async fn debt_list(State(svc): State<AppState>, caller: Principal) -> Result<Json<Vec<Order>>, ServiceError> {
    Ok(Json(svc.debt_list(&caller)?))
}

async fn revenue_report(
    State(svc): State<AppState>,
    caller: Principal,
    Query(range): Query<DateRange>,
) -> Result<Json<RevenueReport>, ServiceError> {
    Ok(Json(svc.revenue_report(&caller, range)?))
}

async fn dashboard(State(svc): State<AppState>, caller: Principal) -> Result<Json<Dashboard>, ServiceError> {
    Ok(Json(svc.dashboard(&caller)?))
}

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use clinic_core::{Principal, ServiceError};

use crate::api::AppState;
use crate::model::{AdjustSlip, GeneratePayroll, PayrollRun, SalarySlip, SlipQuery};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payroll/run", post(run_payroll))
        .route("/payroll/slips", get(list_slips))
        .route("/payroll/slips/{id}", get(get_slip).patch(adjust_slip))
        .route("/payroll/slips/{id}/confirm", post(confirm_slip))
        .route("/payroll/slips/{id}/pay", post(pay_slip))
}

async fn run_payroll(
    State(svc): State<AppState>,
    caller: Principal,
    Json(input): Json<GeneratePayroll>,
) -> Result<Json<PayrollRun>, ServiceError> {
    Ok(Json(svc.run_payroll(&caller, input)?))
}

async fn list_slips(
    State(svc): State<AppState>,
    caller: Principal,
    Query(query): Query<SlipQuery>,
) -> Result<Json<Vec<SalarySlip>>, ServiceError> {
    Ok(Json(svc.list_slips(&caller, &query)?))
}

async fn get_slip(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<Json<SalarySlip>, ServiceError> {
    Ok(Json(svc.get_slip(&caller, &id)?))
}

async fn adjust_slip(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
    Json(input): Json<AdjustSlip>,
) -> Result<Json<SalarySlip>, ServiceError> {
    Ok(Json(svc.adjust_slip(&caller, &id, input)?))
}

async fn confirm_slip(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<Json<SalarySlip>, ServiceError> {
    Ok(Json(svc.confirm_slip(&caller, &id)?))
}

async fn pay_slip(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<Json<SalarySlip>, ServiceError> {
    Ok(Json(svc.pay_slip(&caller, &id)?))
}

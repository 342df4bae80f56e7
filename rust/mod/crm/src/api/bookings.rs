use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use clinic_core::{ListResult, Principal, ServiceError};

use crate::api::AppState;
use crate::model::{Appointment, AppointmentQuery, CalendarEvent, CalendarWindow, CreateAppointment};
use crate::service::Transition;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(list_appointments).post(create_appointment))
        .route("/appointments/calendar", get(calendar))
        .route("/appointments/{id}", get(get_appointment).patch(update_appointment))
        .route("/appointments/{id}/{action}", post(transition))
}

fn parse_action(action: &str) -> Option<Transition> {
    match action {
        "confirm" => Some(Transition::Confirm),
        "check-in" => Some(Transition::CheckIn),
        "complete" => Some(Transition::Complete),
        "cancel" => Some(Transition::Cancel),
        "no-show" => Some(Transition::NoShow),
        _ => None,
    }
}

async fn list_appointments(
    State(svc): State<AppState>,
    caller: Principal,
    Query(query): Query<AppointmentQuery>,
) -> Result<Json<ListResult<Appointment>>, ServiceError> {
    Ok(Json(svc.list_appointments(&caller, &query)?))
}

async fn create_appointment(
    State(svc): State<AppState>,
    caller: Principal,
    Json(input): Json<CreateAppointment>,
) -> Result<(StatusCode, Json<Appointment>), ServiceError> {
    let appt = svc.create_appointment(&caller, input)?;
    Ok((StatusCode::CREATED, Json(appt)))
}

async fn calendar(
    State(svc): State<AppState>,
    caller: Principal,
    Query(window): Query<CalendarWindow>,
) -> Result<Json<Vec<CalendarEvent>>, ServiceError> {
    Ok(Json(svc.calendar(&caller, window)?))
}

async fn get_appointment(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<Json<Appointment>, ServiceError> {
    Ok(Json(svc.get_appointment(&caller, &id)?))
}

async fn update_appointment(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Appointment>, ServiceError> {
    Ok(Json(svc.update_appointment(&caller, &id, patch)?))
}

async fn transition(
    State(svc): State<AppState>,
    caller: Principal,
    Path((id, action)): Path<(String, String)>,
) -> Result<Json<Appointment>, ServiceError> {
    let transition = parse_action(&action)
        .ok_or_else(|| ServiceError::NotFound(format!("unknown appointment action '{action}'")))?;
    Ok(Json(svc.transition_appointment(&caller, &id, transition)?))
}

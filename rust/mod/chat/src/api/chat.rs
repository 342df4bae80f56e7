use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use clinic_core::{Principal, ServiceError};

use crate::api::AppState;
use crate::model::{CreateRoom, Message, MessageQuery, OpenDirect, PollQuery, Room, SendMessage};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(list_rooms).post(create_room))
        .route("/direct", post(open_direct))
        .route("/rooms/{id}", get(get_room))
        .route("/rooms/{id}/messages", get(list_messages).post(send_message))
        .route("/rooms/{id}/poll", get(poll))
}

async fn list_rooms(State(svc): State<AppState>, caller: Principal) -> Result<Json<Vec<Room>>, ServiceError> {
    Ok(Json(svc.list_rooms(&caller)?))
}

async fn create_room(
    State(svc): State<AppState>,
    caller: Principal,
    Json(input): Json<CreateRoom>,
) -> Result<(StatusCode, Json<Room>), ServiceError> {
    let room = svc.create_room(&caller, &input.name, &input.members)?;
    Ok((StatusCode::CREATED, Json(room)))
}

async fn open_direct(
    State(svc): State<AppState>,
    caller: Principal,
    Json(input): Json<OpenDirect>,
) -> Result<Json<Room>, ServiceError> {
    Ok(Json(svc.open_direct(&caller, &input.staff_id)?))
}

async fn get_room(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<Json<Room>, ServiceError> {
    Ok(Json(svc.get_room(&caller, &id)?))
}

async fn list_messages(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
    Query(query): Query<MessageQuery>,
) -> Result<Json<Vec<Message>>, ServiceError> {
    Ok(Json(svc.list_messages(&caller, &id, query.after, query.limit)?))
}

async fn send_message(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
    Json(input): Json<SendMessage>,
) -> Result<(StatusCode, Json<Message>), ServiceError> {
    let message = svc.send_message(&caller, &id, &input.body)?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn poll(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
    Query(query): Query<PollQuery>,
) -> Result<Json<Vec<Message>>, ServiceError> {
    Ok(Json(svc.receive(&caller, &id, query.after, query.timeout).await?))
}

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use clinic_core::{ListResult, Principal, ServiceError};

use crate::api::AppState;
use crate::model::{
    AttemptQuery, CreateDocument, CreateQuestion, DocumentQuery, DrawQuiz, ProductDocument, QuestionQuery, Quiz,
    QuizAttempt, QuizResult, SubmitQuiz, TrainingQuestion,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/documents", get(list_documents).post(create_document))
        .route(
            "/documents/{id}",
            get(get_document).patch(update_document).delete(delete_document),
        )
        .route("/questions", get(list_questions).post(create_question))
        .route(
            "/questions/{id}",
            get(get_question).patch(update_question).delete(delete_question),
        )
        .route("/quiz", get(draw_quiz))
        .route("/quiz/submit", post(submit_quiz))
        .route("/quiz/attempts", get(list_attempts))
}

async fn list_documents(
    State(svc): State<AppState>,
    caller: Principal,
    Query(query): Query<DocumentQuery>,
) -> Result<Json<ListResult<ProductDocument>>, ServiceError> {
    Ok(Json(svc.list_documents(&caller, &query)?))
}

async fn create_document(
    State(svc): State<AppState>,
    caller: Principal,
    Json(input): Json<CreateDocument>,
) -> Result<(StatusCode, Json<ProductDocument>), ServiceError> {
    let doc = svc.create_document(&caller, input)?;
    Ok((StatusCode::CREATED, Json(doc)))
}

async fn get_document(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<Json<ProductDocument>, ServiceError> {
    Ok(Json(svc.get_document(&caller, &id)?))
}

async fn update_document(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<ProductDocument>, ServiceError> {
    Ok(Json(svc.update_document(&caller, &id, patch)?))
}

async fn delete_document(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_document(&caller, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_questions(
    State(svc): State<AppState>,
    caller: Principal,
    Query(query): Query<QuestionQuery>,
) -> Result<Json<Vec<TrainingQuestion>>, ServiceError> {
    Ok(Json(svc.list_questions(&caller, &query)?))
}

async fn create_question(
    State(svc): State<AppState>,
    caller: Principal,
    Json(input): Json<CreateQuestion>,
) -> Result<(StatusCode, Json<TrainingQuestion>), ServiceError> {
    let question = svc.create_question(&caller, input)?;
    Ok((StatusCode::CREATED, Json(question)))
}

async fn get_question(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<Json<TrainingQuestion>, ServiceError> {
    Ok(Json(svc.get_question(&caller, &id)?))
}

async fn update_question(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<TrainingQuestion>, ServiceError> {
    Ok(Json(svc.update_question(&caller, &id, patch)?))
}

async fn delete_question(
    State(svc): State<AppState>,
    caller: Principal,
    Path(id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    svc.delete_question(&caller, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn draw_quiz(
    State(svc): State<AppState>,
    caller: Principal,
    Query(query): Query<DrawQuiz>,
) -> Result<Json<Quiz>, ServiceError> {
    Ok(Json(svc.draw_quiz(&caller, &query)?))
}

async fn submit_quiz(
    State(svc): State<AppState>,
    caller: Principal,
    Json(input): Json<SubmitQuiz>,
) -> Result<Json<QuizResult>, ServiceError> {
    Ok(Json(svc.submit_quiz(&caller, input)?))
}

async fn list_attempts(
    State(svc): State<AppState>,
    caller: Principal,
    Query(query): Query<AttemptQuery>,
) -> Result<Json<ListResult<QuizAttempt>>, ServiceError> {
    Ok(Json(svc.list_attempts(&caller, &query)?))
}

//! Staff login: verifies the password and issues a JWT.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use clinic_core::ServiceError;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth_middleware::Claims;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login_handler))
}

async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ServiceError> {
    let staff = state.staff.authenticate(&body.username, &body.password)?;

    let now = chrono::Utc::now().timestamp();
    let expire_secs = state.config.jwt.expire_secs;
    let claims = Claims {
        sub: staff.id.clone(),
        name: staff.name.clone(),
        role: staff.role,
        team: staff.team,
        iat: now,
        exp: now + expire_secs as i64,
    };

    let key = EncodingKey::from_secret(state.config.jwt.secret.as_bytes());
    let token = encode(&Header::default(), &claims, &key)
        .map_err(|e| ServiceError::Internal(format!("failed to encode JWT: {e}")))?;
    info!(staff = %staff.id, role = ?staff.role, "login");

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: expire_secs,
    }))
}

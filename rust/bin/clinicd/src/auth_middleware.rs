//! JWT authentication middleware.
//!
//! Extracts the JWT from `Authorization: Bearer <token>`, validates it and
//! stores the caller's `Principal` for downstream handlers.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use clinic_core::{Principal, Role, ServiceError, Team};
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// JWT claims payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: staff id.
    pub sub: String,
    /// Display name.
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}

impl From<Claims> for Principal {
    fn from(c: Claims) -> Self {
        Principal {
            staff_id: c.sub,
            name: c.name,
            role: c.role,
            team: c.team,
        }
    }
}

/// Shared JWT configuration for the middleware.
#[derive(Clone)]
pub struct JwtState {
    pub decoding_key: DecodingKey,
    pub validation: Validation,
}

impl JwtState {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }
}

/// Public paths pass through; everything else needs a valid token.
pub async fn auth_middleware(
    State(jwt_state): State<Arc<JwtState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    if is_public_path(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ServiceError::Unauthorized("missing authorization token".into()))?;

    let token_data = jsonwebtoken::decode::<Claims>(token, &jwt_state.decoding_key, &jwt_state.validation)
        .map_err(|e| ServiceError::Unauthorized(format!("invalid token: {e}")))?;

    request.extensions_mut().insert(Principal::from(token_data.claims));
    Ok(next.run(request).await)
}

fn is_public_path(path: &str) -> bool {
    matches!(path, "/health" | "/version" | "/auth/login")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_system_paths_are_public() {
        assert!(is_public_path("/health"));
        assert!(is_public_path("/auth/login"));
        assert!(!is_public_path("/crm/customers"));
        assert!(!is_public_path("/auth/login/extra"));
    }
}

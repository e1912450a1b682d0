use axum::{extract::State, response::IntoResponse, Extension, Json};
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::ApiError,
    extractors::AppJson,
    middlewares::auth::{JwtClaims, JwtService},
    models::user::{AuthResponse, LoginRequest, UserProfile},
    services::AppState,
};

const DEMO_USER_ID: &str = "demo-user";
const TOKEN_TTL_SECONDS: i64 = 24 * 3600;

/// POST /api/v1/auth/login - demo credentials provider: any e-mail is
/// accepted and mapped to the single demo identity.
pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::validation(format!("Validation error: {}", e)))?;

    let name = req.name.unwrap_or_else(|| "Demo Student".to_string());

    tracing::info!("Demo login for {}", req.email);

    let now = chrono::Utc::now().timestamp();
    let claims = JwtClaims {
        sub: DEMO_USER_ID.to_string(),
        email: req.email.clone(),
        name: name.clone(),
        exp: (now + TOKEN_TTL_SECONDS) as usize,
        iat: now as usize,
    };

    let token = JwtService::new(&state.config.jwt_secret)
        .generate_token(claims)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to issue token: {}", e)))?;

    Ok(Json(AuthResponse {
        token,
        user: UserProfile {
            id: DEMO_USER_ID.to_string(),
            email: req.email,
            name,
        },
    }))
}

/// GET /api/v1/auth/me - profile of the authenticated caller.
pub async fn get_current_user(
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(UserProfile {
        id: claims.sub,
        email: claims.email,
        name: claims.name,
    }))
}

//! Signup and login handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use chathub_auth::SignupRequest as NewAccount;

use crate::dto::request::{LoginRequest, SignupRequest};
use crate::dto::response::{MessageResponse, TokenResponse};
use crate::error::ApiError;
use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    state
        .auth
        .signup(NewAccount {
            username: req.username,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User created successfully".to_string(),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(TokenResponse { token }))
}

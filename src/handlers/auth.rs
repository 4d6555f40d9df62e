//! Handlers for registration, login and session endpoints.

use axum::{Extension, Json, extract::State, http::StatusCode};
use tracing::{info, warn};

use crate::AppState;
use crate::models::auth::{LoginRequest, RegisterRequest, TokenResponse, UserResponse};
use crate::models::product::{ErrorResponse, MessageResponse};
use crate::services::auth::{AuthError, Claims};

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), (StatusCode, Json<ErrorResponse>)> {
    let correlation_id = uuid::Uuid::new_v4().to_string();
    info!(
        correlation_id = %correlation_id,
        email = %payload.email,
        "Registration request received"
    );

    validate_register(&payload)?;

    let user = state
        .auth
        .register(
            payload.name.trim().to_string(),
            payload.email.trim().to_lowercase(),
            payload.password,
        )
        .await
        .map_err(|e| {
            warn!(correlation_id = %correlation_id, error = %e, "Registration failed");
            map_auth_error(e)
        })?;

    info!(
        correlation_id = %correlation_id,
        user_id = user.id,
        "User registered"
    );

    Ok((StatusCode::CREATED, Json(UserResponse::from_model(user))))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, (StatusCode, Json<ErrorResponse>)> {
    validate_login(&payload)?;

    let email = payload.email.trim().to_lowercase();
    let (user, token) = state
        .auth
        .login(&email, &payload.password)
        .await
        .map_err(|e| {
            warn!(email = %email, error = %e, "Login failed");
            map_auth_error(e)
        })?;

    info!(user_id = user.id, "User logged in");

    Ok(Json(TokenResponse::from_issued(token)))
}

/// POST /api/auth/logout
///
/// Tokens are stateless and cannot be revoked server side; clients drop
/// the token and it ages out at `exp`.
pub async fn logout(Extension(claims): Extension<Claims>) -> Json<MessageResponse> {
    info!(user_id = claims.sub, "User logged out");

    Json(MessageResponse {
        message: "Successfully logged out".to_string(),
    })
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<TokenResponse>, (StatusCode, Json<ErrorResponse>)> {
    let user = state
        .auth
        .current_user(&claims)
        .await
        .map_err(map_auth_error)?;
    let token = state.auth.issue_token(&user).map_err(map_auth_error)?;

    Ok(Json(TokenResponse::from_issued(token)))
}

/// POST /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserResponse>, (StatusCode, Json<ErrorResponse>)> {
    let user = state
        .auth
        .current_user(&claims)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(UserResponse::from_model(user)))
}

fn validate_register(payload: &RegisterRequest) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(validation_error("name is required".to_string()));
    }
    if name.len() > 255 {
        return Err(validation_error("name must be at most 255 characters".to_string()));
    }

    let email = payload.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(validation_error("a valid email is required".to_string()));
    }
    if email.len() > 255 {
        return Err(validation_error("email must be at most 255 characters".to_string()));
    }

    if payload.password.len() < 8 {
        return Err(validation_error(
            "password must be at least 8 characters".to_string(),
        ));
    }

    Ok(())
}

fn validate_login(payload: &LoginRequest) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    if payload.email.trim().is_empty() {
        return Err(validation_error("email is required".to_string()));
    }
    if payload.password.is_empty() {
        return Err(validation_error("password is required".to_string()));
    }

    Ok(())
}

fn validation_error(msg: String) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(ErrorResponse { error: msg }))
}

fn map_auth_error(err: AuthError) -> (StatusCode, Json<ErrorResponse>) {
    match err {
        AuthError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Invalid credentials".to_string(),
            }),
        ),
        AuthError::EmailTaken(email) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: format!("Email {} is already registered", email),
            }),
        ),
        AuthError::InvalidToken(msg) => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: format!("Invalid token: {}", msg),
            }),
        ),
        AuthError::Hashing(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Password hashing error: {}", msg),
            }),
        ),
        AuthError::Database(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Database error: {}", msg),
            }),
        ),
    }
}

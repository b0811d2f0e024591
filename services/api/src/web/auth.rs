//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for signup, login, logout, the current profile,
//! and password reset.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_assistant_core::domain::{PasswordReset, User};
use study_assistant_core::ports::PortError;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::middleware::{session_cookie, SESSION_COOKIE};
use crate::web::rest::{port_error, HandlerError};
use crate::web::state::AppState;

const MIN_PASSWORD_LEN: usize = 6;
const RESET_TOKEN_TTL_MINUTES: i64 = 60;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub new_password: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn normalize_email(email: &str) -> Result<String, HandlerError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err((StatusCode::BAD_REQUEST, "A valid email address is required".to_string()));
    }
    Ok(email)
}

fn check_password(password: &str) -> Result<(), HandlerError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, HandlerError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to hash password".to_string())
        })
}

fn session_cookie_header(session_id: &str, max_age_seconds: i64) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, session_id, max_age_seconds
    )
}

/// Creates an auth session for the user and returns the `Set-Cookie` value.
async fn start_session(state: &AppState, user_id: Uuid) -> Result<String, HandlerError> {
    let auth_session_id = Uuid::new_v4().to_string();
    let ttl = Duration::try_days(state.config.session_ttl_days).ok_or_else(|| {
        error!("Session TTL of {} days is out of range", state.config.session_ttl_days);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session".to_string())
    })?;

    state
        .db
        .create_auth_session(&auth_session_id, user_id, Utc::now() + ttl)
        .await
        .map_err(port_error("Failed to create session"))?;

    Ok(session_cookie_header(&auth_session_id, ttl.num_seconds()))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let email = normalize_email(&req.email)?;
    check_password(&req.password)?;
    let password_hash = hash_password(&req.password)?;

    let user = state
        .db
        .create_user_with_email(&email, &password_hash)
        .await
        .map_err(port_error("Failed to create user"))?;

    let cookie = start_session(&state, user.user_id).await?;
    info!("Created user {}", user.user_id);

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            user_id: user.user_id,
            email: user.email,
        }),
    ))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let invalid = || (StatusCode::UNAUTHORIZED, "Invalid email or password".to_string());
    let email = normalize_email(&req.email).map_err(|_| invalid())?;

    let user_creds = state.db.get_user_by_email(&email).await.map_err(|e| {
        warn!("Login failed for {}: {:?}", email, e);
        invalid()
    })?;

    let parsed_hash = PasswordHash::new(&user_creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Authentication error".to_string())
    })?;

    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(invalid());
    }

    let cookie = start_session(&state, user_creds.user_id).await?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            user_id: user_creds.user_id,
            email: user_creds.email,
        }),
    ))
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HandlerError> {
    let auth_session_id = session_cookie(&headers)
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    state
        .db
        .delete_auth_session(auth_session_id)
        .await
        .map_err(port_error("Failed to logout"))?;

    Ok((StatusCode::OK, [(header::SET_COOKIE, session_cookie_header("", 0))]))
}

/// GET /auth/me - The signed-in user's profile
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "The current user", body = User),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<Json<User>, HandlerError> {
    let user = state
        .db
        .get_user_by_id(user_id)
        .await
        .map_err(port_error("Failed to load your profile"))?;
    Ok(Json(user))
}

/// POST /auth/password-reset - Send a password reset token
///
/// Always answers 202 so the response does not reveal whether the email is registered.
#[utoipa::path(
    post,
    path = "/auth/password-reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 202, description = "If the account exists, a reset token was sent"),
        (status = 400, description = "Invalid email")
    )
)]
pub async fn password_reset_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PasswordResetRequest>,
) -> Result<StatusCode, HandlerError> {
    let email = normalize_email(&req.email)?;

    let user = match state.db.get_user_by_email(&email).await {
        Ok(user) => user,
        Err(PortError::NotFound(_)) => {
            info!("Password reset requested for unknown email");
            return Ok(StatusCode::ACCEPTED);
        }
        Err(e) => return Err(port_error("Failed to request a password reset")(e)),
    };

    let reset = PasswordReset {
        token: Uuid::new_v4().simple().to_string(),
        user_id: user.user_id,
        expires_at: Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES),
    };
    let token = reset.token.clone();

    state
        .db
        .create_password_reset(reset)
        .await
        .map_err(port_error("Failed to request a password reset"))?;
    state
        .reset_notifier
        .send_reset(&user.email, &token)
        .await
        .map_err(port_error("Failed to send the password reset email"))?;

    Ok(StatusCode::ACCEPTED)
}

/// POST /auth/password-reset/confirm - Set a new password with a reset token
///
/// Every existing session of the user is signed out.
#[utoipa::path(
    post,
    path = "/auth/password-reset/confirm",
    request_body = PasswordResetConfirm,
    responses(
        (status = 200, description = "Password updated"),
        (status = 400, description = "Password too short"),
        (status = 401, description = "Unknown or expired token")
    )
)]
pub async fn password_reset_confirm_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PasswordResetConfirm>,
) -> Result<StatusCode, HandlerError> {
    check_password(&req.new_password)?;

    let user_id = state
        .db
        .consume_password_reset(req.token.trim())
        .await
        .map_err(port_error("This reset link is invalid or has expired"))?;

    let password_hash = hash_password(&req.new_password)?;
    state
        .db
        .update_password(user_id, &password_hash)
        .await
        .map_err(port_error("Failed to update the password"))?;
    state
        .db
        .delete_user_sessions(user_id)
        .await
        .map_err(port_error("Failed to sign out existing sessions"))?;

    info!("Password reset completed for user {}", user_id);
    Ok(StatusCode::OK)
}

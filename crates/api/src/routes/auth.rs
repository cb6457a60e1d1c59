//! Auth route handlers.
//!
//! Signup/login return `{token, user}`; the password-reset flow is
//! request-code → verify-code → set-new-password, with the 6-digit code
//! delivered by email.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::User;
use crate::services::AuthService;
use crate::state::AppState;
use crate::validation::FieldErrors;

/// Response carrying a bearer token and the user it authenticates.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// Simple acknowledgement response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Signup request payload.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
}

/// Create a new customer account.
///
/// POST /api/v1/auth/signup
#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let mut errors = FieldErrors::new();
    errors.require_len("name", &payload.name, 2, 100);
    errors.require_len_opt("phone", payload.phone.as_deref(), 6, 20);
    errors.finish()?;

    let auth = AuthService::new(state.pool(), &state.config().jwt);
    let (user, token) = auth
        .register(
            payload.name.trim(),
            &payload.email,
            payload.phone.as_deref(),
            &payload.password,
        )
        .await?;

    tracing::info!(user_id = %user.id, "New account created");
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// Login request payload.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login with email and password.
///
/// POST /api/v1/auth/login
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let auth = AuthService::new(state.pool(), &state.config().jwt);
    let (user, token) = auth.login(&payload.email, &payload.password).await?;
    Ok(Json(AuthResponse { token, user }))
}

/// Forgot-password request payload.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Start the password-reset flow.
///
/// POST /api/v1/auth/forgot-password
///
/// Always responds with the same acknowledgement so account existence is
/// not leaked.
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let auth = AuthService::new(state.pool(), &state.config().jwt);

    if let Some((user, code)) = auth.request_password_reset(&payload.email).await? {
        state
            .email()
            .send_reset_code(user.email.as_str(), &user.name, &code)
            .await?;
    }

    Ok(Json(MessageResponse {
        message: "if the email exists, a reset code has been sent",
    }))
}

/// Verify-reset-code request payload.
#[derive(Debug, Deserialize)]
pub struct VerifyResetCodeRequest {
    pub email: String,
    pub code: String,
}

/// Verify a password-reset code.
///
/// POST /api/v1/auth/verify-reset-code
#[instrument(skip(state, payload))]
pub async fn verify_reset_code(
    State(state): State<AppState>,
    Json(payload): Json<VerifyResetCodeRequest>,
) -> Result<Json<MessageResponse>> {
    let auth = AuthService::new(state.pool(), &state.config().jwt);
    auth.verify_reset_code(&payload.email, &payload.code).await?;
    Ok(Json(MessageResponse {
        message: "reset code verified",
    }))
}

/// Reset-password request payload.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub password: String,
}

/// Complete the password-reset flow.
///
/// PUT /api/v1/auth/reset-password
#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<AuthResponse>> {
    let auth = AuthService::new(state.pool(), &state.config().jwt);
    let (user, token) = auth.reset_password(&payload.email, &payload.password).await?;
    Ok(Json(AuthResponse { token, user }))
}

/// Current user profile.
///
/// GET /api/v1/auth/me
#[instrument(skip(user))]
pub async fn me(RequireUser(user): RequireUser) -> Json<User> {
    Json(user)
}

/// Profile update payload. `None` fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Update the current user's profile.
///
/// PUT /api/v1/auth/me
#[instrument(skip(state, user, payload))]
pub async fn update_me(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateMeRequest>,
) -> Result<Json<User>> {
    let mut errors = FieldErrors::new();
    errors.require_len_opt("name", payload.name.as_deref(), 2, 100);
    errors.require_len_opt("phone", payload.phone.as_deref(), 6, 20);
    errors.finish()?;

    let auth = AuthService::new(state.pool(), &state.config().jwt);
    let updated = auth
        .update_profile(
            user.id,
            payload.name.as_deref().map(str::trim),
            payload.email.as_deref(),
            payload.phone.as_deref(),
        )
        .await?;
    Ok(Json(updated))
}

/// Change-password request payload.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Fresh-token response after a password change.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Change the current user's password.
///
/// PUT /api/v1/auth/change-password
///
/// Old tokens become stale; the response carries a fresh one.
#[instrument(skip(state, user, payload))]
pub async fn change_password(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<TokenResponse>> {
    let auth = AuthService::new(state.pool(), &state.config().jwt);
    let token = auth
        .change_password(&user, &payload.current_password, &payload.new_password)
        .await?;
    Ok(Json(TokenResponse { token }))
}

/// Deactivate the current account.
///
/// DELETE /api/v1/auth/me
#[instrument(skip(state, user))]
pub async fn deactivate(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    let auth = AuthService::new(state.pool(), &state.config().jwt);
    auth.deactivate(user.id).await?;
    tracing::info!(user_id = %user.id, "Account deactivated");
    Ok(StatusCode::NO_CONTENT)
}

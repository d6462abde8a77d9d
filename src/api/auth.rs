//! Authentication endpoints

use axum::{extract::{rejection::JsonRejection, State}, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{error::AppResult, models::User};

use super::AuthenticatedUser;

/// Login request
#[derive(Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
    pub user: UserInfo,
}

/// The logged-in operator
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    /// At least 6 characters
    pub new_password: String,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Login with username and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing fields", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<LoginResponse>> {
    let Json(request) = payload?;
    request.validate()?;

    let (token, user) = state
        .services
        .auth
        .login(&request.username, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.auth.jwt_expiration_hours * 3600,
        user: user.into(),
    }))
}

/// Get current user info
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user info", body = UserInfo),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn me(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<UserInfo>> {
    let user = state.services.auth.me(claims.user_id).await?;
    Ok(Json(user.into()))
}

/// Change the current user's password
#[utoipa::path(
    post,
    path = "/change-password",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "New password too short", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated or wrong current password", body = crate::error::ErrorResponse)
    )
)]
pub async fn change_password(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> AppResult<Json<MessageResponse>> {
    let Json(request) = payload?;

    state
        .services
        .auth
        .change_password(claims.user_id, &request.current_password, &request.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password changed".to_string(),
    }))
}

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
};
use buddyperks_db::models::User;
use buddyperks_services::{ServiceError, approval::RegistrationForm, auth::TokenPair};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError, extractors::auth::AuthUser, routes::admin::RequestResponse, state::AppState,
};

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub service: String,
    pub category: String,
    pub buddy_id: String,
    pub buddy_credit: i32,
    pub status: String,
    pub is_banned: bool,
    pub ban_reason: Option<String>,
    pub approval_date: DateTime<Utc>,
}

pub(crate) fn to_user_response(user: User) -> UserResponse {
    UserResponse {
        id: user.id.map(|id| id.to_hex()).unwrap_or_default(),
        first_name: user.first_name,
        last_name: user.last_name,
        email: user.email,
        phone_number: user.phone_number,
        service: user.service,
        category: user.category,
        buddy_id: user.buddy_id,
        buddy_credit: user.buddy_credit,
        status: user.status.as_str().to_string(),
        is_banned: user.is_banned,
        ban_reason: user.ban_reason,
        approval_date: user.approval_date.to_chrono(),
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Registration creates a pending request; an admin turns it into a user.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegistrationForm>,
) -> Result<(StatusCode, Json<RequestResponse>), ApiError> {
    let request = state.approvals.submit(body).await?;
    Ok((StatusCode::CREATED, Json(request.into())))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), ApiError> {
    let email = body.email.trim().to_lowercase();
    let user = state
        .users
        .find_by_email(&email)
        .await
        .map_err(|_| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    if !state.auth.verify_password(&body.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    session(&state, user)
}

pub async fn logout() -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static("access_token=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0"),
    );
    Ok(headers)
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.accounts.get(auth.user_id).await?;
    Ok(Json(to_user_response(user)))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), ApiError> {
    let claims = state.auth.verify_refresh_token(&body.refresh_token)?;

    let user_id = bson::oid::ObjectId::parse_str(&claims.sub)
        .map_err(|_| ApiError::Unauthorized("Invalid user ID".to_string()))?;

    let user = state.accounts.get(user_id).await.map_err(|e| match e {
        ServiceError::NotFound(_) => ApiError::Unauthorized("User no longer exists".to_string()),
        other => other.into(),
    })?;

    session(&state, user)
}

fn session(state: &AppState, user: User) -> Result<(HeaderMap, Json<AuthResponse>), ApiError> {
    let user_id = user
        .id
        .ok_or_else(|| ApiError::Internal("User without id".to_string()))?;
    let tokens = state
        .auth
        .generate_tokens(user_id, &user.email, &user.buddy_id)?;

    let headers = cookie_headers(&tokens)?;
    let response = AuthResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
        user: to_user_response(user),
    };

    Ok((headers, Json(response)))
}

fn cookie_headers(tokens: &TokenPair) -> Result<HeaderMap, ApiError> {
    let cookie = format!(
        "access_token={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        tokens.access_token, tokens.expires_in
    );
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie).map_err(|e| ApiError::Internal(e.to_string()))?,
    );
    Ok(headers)
}

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use buddyperks_db::models::{DocumentRef, RegistrationRequest, RequestStatus};
use buddyperks_services::approval::RequestListing;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    extractors::admin::AdminUser,
    routes::{
        auth::{UserResponse, to_user_response},
        parse_id,
    },
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct RequestResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub service: String,
    pub category: String,
    pub document: DocumentRef,
    pub requested_at: DateTime<Utc>,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl From<RegistrationRequest> for RequestResponse {
    fn from(r: RegistrationRequest) -> Self {
        Self {
            id: r.id.map(|id| id.to_hex()).unwrap_or_default(),
            first_name: r.first_name,
            last_name: r.last_name,
            email: r.email,
            phone_number: r.phone_number,
            service: r.service,
            category: r.category,
            document: r.document,
            requested_at: r.requested_at.to_chrono(),
            status: r.status.as_str().to_string(),
            rejection_reason: r.rejection_reason,
            reviewed_at: r.reviewed_at.map(|d| d.to_chrono()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RequestListResponse {
    Requests(Vec<RequestResponse>),
    Users(Vec<UserResponse>),
}

#[derive(Debug, Deserialize)]
pub struct RequestListQuery {
    #[serde(default)]
    pub status: RequestStatus,
}

#[derive(Debug, Deserialize)]
pub struct ReasonRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct CreditRequest {
    pub buddy_credit: i32,
}

pub async fn list_requests(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<RequestListQuery>,
) -> Result<Json<RequestListResponse>, ApiError> {
    let listing = match state.approvals.list(query.status).await? {
        RequestListing::Requests(requests) => {
            RequestListResponse::Requests(requests.into_iter().map(Into::into).collect())
        }
        RequestListing::Users(users) => {
            RequestListResponse::Users(users.into_iter().map(to_user_response).collect())
        }
    };
    Ok(Json(listing))
}

pub async fn approve(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(request_id): Path<String>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let id = parse_id(&request_id, "request_id")?;
    let user = state.approvals.approve(id).await?;
    Ok((StatusCode::CREATED, Json(to_user_response(user))))
}

pub async fn reject(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(request_id): Path<String>,
    Json(body): Json<ReasonRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_id(&request_id, "request_id")?;
    state.approvals.reject(id, body.reason).await?;
    Ok(Json(serde_json::json!({ "rejected": true })))
}

pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.accounts.list_users().await?;
    Ok(Json(users.into_iter().map(to_user_response).collect()))
}

pub async fn ban(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<String>,
    Json(body): Json<ReasonRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_id(&user_id, "user_id")?;
    let user = state.accounts.ban(id, body.reason).await?;
    Ok(Json(to_user_response(user)))
}

pub async fn unban(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_id(&user_id, "user_id")?;
    let user = state.accounts.unban(id).await?;
    Ok(Json(to_user_response(user)))
}

pub async fn set_credit(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<String>,
    Json(body): Json<CreditRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_id(&user_id, "user_id")?;
    let user = state.accounts.set_buddy_credit(id, body.buddy_credit).await?;
    Ok(Json(to_user_response(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&user_id, "user_id")?;
    state.accounts.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

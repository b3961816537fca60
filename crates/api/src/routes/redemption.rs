use axum::{
    Json,
    extract::{Path, Query, State},
};
use buddyperks_db::models::{ItemType, Redemption, UserSnapshot};
use buddyperks_services::dao::base::{PaginatedResult, PaginationParams};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::ApiError,
    extractors::{admin::AdminUser, auth::AuthUser},
    routes::parse_id,
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct RedemptionResponse {
    pub id: String,
    pub item_type: ItemType,
    pub inventory_item_id: String,
    pub claimed_code: Option<String>,
    pub user_id: String,
    pub buddy_id: String,
    pub user_snapshot: UserSnapshot,
    pub company: String,
    pub product_name: String,
    pub discount_percentage: f64,
    pub category: Vec<String>,
    pub redeemed_at: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub status: String,
}

impl From<Redemption> for RedemptionResponse {
    fn from(r: Redemption) -> Self {
        Self {
            id: r.id.map(|id| id.to_hex()).unwrap_or_default(),
            item_type: r.item_type,
            inventory_item_id: r.inventory_item_id.to_hex(),
            claimed_code: r.claimed_code,
            user_id: r.user_id.to_hex(),
            buddy_id: r.buddy_id,
            user_snapshot: r.user_snapshot,
            company: r.company,
            product_name: r.product_name,
            discount_percentage: r.discount_percentage,
            category: r.category,
            redeemed_at: r.redeemed_at.to_chrono(),
            expiry_date: r.expiry_date.to_chrono(),
            status: r.status.as_str().to_string(),
        }
    }
}

/// The caller's own redemptions, newest first.
pub async fn list_mine(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<PaginatedResult<RedemptionResponse>>, ApiError> {
    let page = state.redemptions.list_for_user(auth.user_id, &params).await?;
    Ok(Json(page.map(RedemptionResponse::from)))
}

pub async fn mark_used(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(redemption_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_id(&redemption_id, "redemption_id")?;
    state.redemptions.mark_used(id).await?;
    Ok(Json(serde_json::json!({ "status": "used" })))
}

pub async fn expire_due(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let expired = state.redemptions.expire_due().await?;
    Ok(Json(serde_json::json!({ "expired": expired })))
}

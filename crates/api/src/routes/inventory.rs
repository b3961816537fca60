use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use buddyperks_db::models::{Capacity, CouponCode, InventoryItem, ItemType};
use buddyperks_services::inventory::{
    InventoryFilter, InventoryListing, InventoryUpdate, NewInventoryItem,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    extractors::{admin::AdminUser, auth::AuthUser},
    routes::{parse_id, redemption::RedemptionResponse, split_list},
    state::AppState,
};

/// Query-string form of [`InventoryFilter`]; list values are comma-separated.
#[derive(Debug, Default, Deserialize)]
pub struct InventoryQuery {
    pub category: Option<String>,
    pub companies: Option<String>,
    pub company: Option<String>,
    pub min_discount: Option<f64>,
    pub max_discount: Option<f64>,
    pub is_featured: Option<bool>,
    pub is_recommended: Option<bool>,
    pub product_name: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl InventoryQuery {
    pub(crate) fn to_filter(&self) -> InventoryFilter {
        InventoryFilter {
            category: split_list(self.category.as_deref()),
            companies: split_list(self.companies.as_deref()),
            company: self.company.clone(),
            min_discount: self.min_discount,
            max_discount: self.max_discount,
            is_featured: self.is_featured,
            is_recommended: self.is_recommended,
            product_name: self.product_name.clone(),
            item_type: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InventoryResponse {
    pub id: String,
    pub item_type: ItemType,
    pub name: String,
    pub description: String,
    pub discount_percent: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub category: Vec<String>,
    pub company: String,
    pub product_tags: Vec<String>,
    pub images: Vec<String>,
    pub is_featured: bool,
    pub is_recommended: bool,
    pub capacity_kind: String,
    pub remaining: i64,
    pub total: i64,
    /// Only present in admin responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codes: Option<Vec<CouponCode>>,
}

pub(crate) fn to_response(item: InventoryItem) -> InventoryResponse {
    InventoryResponse {
        id: item.id.map(|id| id.to_hex()).unwrap_or_default(),
        item_type: item.item_type,
        name: item.name,
        description: item.description,
        discount_percent: item.discount_percent,
        start_date: item.start_date.to_chrono(),
        end_date: item.end_date.to_chrono(),
        category: item.category,
        company: item.company,
        product_tags: item.product_tags,
        images: item.images,
        is_featured: item.is_featured,
        is_recommended: item.is_recommended,
        capacity_kind: item.capacity.kind().to_string(),
        remaining: item.capacity.remaining(),
        total: item.capacity.total(),
        codes: None,
    }
}

fn to_admin_response(item: InventoryItem) -> InventoryResponse {
    let codes = match &item.capacity {
        Capacity::CodeBased { codes } => Some(codes.clone()),
        Capacity::CounterBased { .. } => None,
    };
    InventoryResponse {
        codes,
        ..to_response(item)
    }
}

#[derive(Debug, Serialize)]
pub struct InventoryListResponse {
    pub items: Vec<InventoryResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<InventoryListing> for InventoryListResponse {
    fn from(listing: InventoryListing) -> Self {
        Self {
            items: listing.items.into_iter().map(to_response).collect(),
            message: listing.message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    pub redemption: RedemptionResponse,
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCouponRequest {
    #[serde(flatten)]
    pub item: NewInventoryItem,
    pub codes: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDiscountRequest {
    #[serde(flatten)]
    pub item: NewInventoryItem,
    pub total_count: i64,
}

pub async fn list_coupons(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<InventoryQuery>,
) -> Result<Json<InventoryListResponse>, ApiError> {
    let listing = state.inventory.list(ItemType::Coupon, query.to_filter()).await?;
    Ok(Json(listing.into()))
}

pub async fn list_discounts(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<InventoryQuery>,
) -> Result<Json<InventoryListResponse>, ApiError> {
    let listing = state.inventory.list(ItemType::Discount, query.to_filter()).await?;
    Ok(Json(listing.into()))
}

pub async fn redeem_coupon(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(coupon_id): Path<String>,
) -> Result<(StatusCode, Json<RedeemResponse>), ApiError> {
    redeem(state, auth, ItemType::Coupon, &coupon_id).await
}

pub async fn redeem_discount(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(discount_id): Path<String>,
) -> Result<(StatusCode, Json<RedeemResponse>), ApiError> {
    redeem(state, auth, ItemType::Discount, &discount_id).await
}

async fn redeem(
    state: AppState,
    auth: AuthUser,
    item_type: ItemType,
    raw_id: &str,
) -> Result<(StatusCode, Json<RedeemResponse>), ApiError> {
    let item_id = parse_id(raw_id, &format!("{item_type}_id"))?;
    let receipt = state
        .redemptions
        .claim(item_type, item_id, auth.user_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RedeemResponse {
            redemption: receipt.redemption.into(),
            code: receipt.code,
        }),
    ))
}

pub async fn create_coupon(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(body): Json<CreateCouponRequest>,
) -> Result<(StatusCode, Json<InventoryResponse>), ApiError> {
    let item = state.inventory.create_coupon(body.item, body.codes).await?;
    Ok((StatusCode::CREATED, Json(to_admin_response(item))))
}

pub async fn create_discount(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(body): Json<CreateDiscountRequest>,
) -> Result<(StatusCode, Json<InventoryResponse>), ApiError> {
    let item = state
        .inventory
        .create_discount(body.item, body.total_count)
        .await?;
    Ok((StatusCode::CREATED, Json(to_admin_response(item))))
}

pub async fn list_all_coupons(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<InventoryResponse>>, ApiError> {
    let items = state.inventory.list_all(ItemType::Coupon).await?;
    Ok(Json(items.into_iter().map(to_admin_response).collect()))
}

pub async fn list_all_discounts(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<InventoryResponse>>, ApiError> {
    let items = state.inventory.list_all(ItemType::Discount).await?;
    Ok(Json(items.into_iter().map(to_admin_response).collect()))
}

pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(item_id): Path<String>,
    Json(body): Json<InventoryUpdate>,
) -> Result<Json<InventoryResponse>, ApiError> {
    let id = parse_id(&item_id, "item_id")?;
    let item = state.inventory.update(id, body).await?;
    Ok(Json(to_admin_response(item)))
}

pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(item_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&item_id, "item_id")?;
    state.inventory.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reconcile(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<buddyperks_services::redemption::ReconciliationReport>, ApiError> {
    Ok(Json(state.redemptions.reconcile().await?))
}

use axum::{
    Json,
    extract::{Query, State},
};
use buddyperks_services::{
    dao::base::{PaginatedResult, PaginationParams},
    inventory::SearchResults,
};
use serde::Serialize;

use crate::{
    error::ApiError,
    routes::inventory::{InventoryQuery, InventoryResponse, to_response},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub coupons: PaginatedResult<InventoryResponse>,
    pub discounts: PaginatedResult<InventoryResponse>,
}

impl From<SearchResults> for SearchResponse {
    fn from(results: SearchResults) -> Self {
        Self {
            coupons: results.coupons.map(to_response),
            discounts: results.discounts.map(to_response),
        }
    }
}

/// Combined coupon and discount search. Public.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<InventoryQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let defaults = PaginationParams::default();
    let params = PaginationParams {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };

    let results = state.inventory.search(query.to_filter(), &params).await?;
    Ok(Json(results.into()))
}

use axum::{
    Json,
    extract::{Query, State},
};
use buddyperks_services::reporting::{
    AnalyticsQuery, DashboardCharts, Period, RedemptionAnalytics, SummaryCounters, SummaryReport,
    UserAnalytics,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    extractors::admin::AdminUser,
    routes::{
        inventory::{InventoryResponse, to_response},
        redemption::RedemptionResponse,
    },
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub period: Period,
}

#[derive(Debug, Serialize)]
pub struct RecentData {
    pub recent_redemptions: Vec<RedemptionResponse>,
    pub expiring_soon: Vec<InventoryResponse>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub period: Period,
    pub summary: SummaryCounters,
    pub charts: DashboardCharts,
    pub recent: RecentData,
}

pub async fn summary(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let dashboard = state.reporting.dashboard_summary(query.period).await?;

    Ok(Json(DashboardResponse {
        period: dashboard.period,
        summary: dashboard.summary,
        charts: dashboard.charts,
        recent: RecentData {
            recent_redemptions: dashboard
                .recent_redemptions
                .into_iter()
                .map(Into::into)
                .collect(),
            expiring_soon: dashboard.expiring_soon.into_iter().map(to_response).collect(),
        },
    }))
}

pub async fn redemption_analytics(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<RedemptionAnalytics>, ApiError> {
    Ok(Json(state.reporting.redemption_analytics(&query).await?))
}

pub async fn user_analytics(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<UserAnalytics>, ApiError> {
    Ok(Json(state.reporting.user_analytics().await?))
}

pub async fn summary_report(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<SummaryReport>, ApiError> {
    Ok(Json(state.reporting.summary_report().await?))
}

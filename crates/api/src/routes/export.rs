use axum::{
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, header},
};
use buddyperks_services::{export::export_redemptions, reporting::AnalyticsQuery};
use tracing::info;

use crate::{error::ApiError, extractors::admin::AdminUser, state::AppState};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Redemption facts as an `.xlsx` download. Accepts the analytics filters.
pub async fn redemptions(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<(HeaderMap, Vec<u8>), ApiError> {
    let rows = state.reporting.redemptions_for_export(&query).await?;
    let bytes = export_redemptions(&rows).map_err(|e| ApiError::Internal(e.to_string()))?;
    info!(rows = rows.len(), bytes = bytes.len(), "Redemption export generated");

    let filename = format!(
        "attachment; filename=\"redemptions-{}.xlsx\"",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    );
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(XLSX_MIME));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&filename).map_err(|e| ApiError::Internal(e.to_string()))?,
    );

    Ok((headers, bytes))
}

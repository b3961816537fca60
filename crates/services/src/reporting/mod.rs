pub mod aggregate;
pub mod period;

use std::sync::Arc;

use bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use buddyperks_config::RedemptionSettings;
use buddyperks_db::models::{InventoryItem, ItemType, Redemption, RequestStatus, UserStatus};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::dao::{
    base::{DAY_FORMAT, MONTH_FORMAT},
    inventory::InventoryDao,
    redemption::RedemptionDao,
    registration::RegistrationDao,
    user::UserDao,
};
use crate::error::{ServiceError, ServiceResult};

pub use crate::dao::inventory::CapacityStats;
pub use aggregate::{ActiveUser, Bucket, Tally};
pub use period::Period;

const TOP_N: i64 = 10;
const RECENT_LIMIT: i64 = 10;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SummaryCounters {
    pub total_coupons: u64,
    pub total_discounts: u64,
    pub total_users: u64,
    pub active_users: u64,
    pub pending_requests: u64,
    pub total_redemptions: u64,
    pub available_coupons: i64,
    pub available_discounts: i64,
    pub average_discount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardCharts {
    pub redemptions_over_time: Vec<Bucket>,
    pub redemptions_by_category: Vec<Tally>,
    pub redemptions_by_company: Vec<Tally>,
    pub redemptions_by_type: Vec<Tally>,
    pub user_registrations_over_time: Vec<Bucket>,
    pub users_by_category: Vec<Tally>,
    pub users_by_service: Vec<Tally>,
    pub redemption_status_distribution: Vec<Tally>,
    pub monthly_redemptions: Vec<Bucket>,
}

#[derive(Debug, Clone)]
pub struct DashboardSummary {
    pub period: Period,
    pub summary: SummaryCounters,
    pub charts: DashboardCharts,
    pub recent_redemptions: Vec<Redemption>,
    pub expiring_soon: Vec<InventoryItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub company: Option<String>,
    pub item_type: Option<ItemType>,
}

impl AnalyticsQuery {
    /// Defaults to the last three months up to now.
    pub fn range(&self, now: DateTime<Utc>) -> ServiceResult<(DateTime<Utc>, DateTime<Utc>)> {
        let end = self.end_date.unwrap_or(now);
        let start = self
            .start_date
            .unwrap_or_else(|| period::months_back(end, 3));
        if start > end {
            return Err(ServiceError::Validation(
                "start_date must not be after end_date".to_string(),
            ));
        }
        Ok((start, end))
    }

    fn to_document(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Document {
        let mut filter = self.field_filter();
        filter.extend(between("redeemed_at", start, end));
        filter
    }

    fn field_filter(&self) -> Document {
        let mut filter = Document::new();
        if let Some(category) = &self.category {
            filter.insert("category", category.clone());
        }
        if let Some(company) = &self.company {
            filter.insert("company", company.clone());
        }
        if let Some(item_type) = self.item_type {
            filter.insert("item_type", item_type.as_str());
        }
        filter
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RedemptionAnalytics {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total: u64,
    pub time_series: Vec<Bucket>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserAnalytics {
    pub user_growth: Vec<Bucket>,
    pub active_users: Vec<ActiveUser>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub coupons: CapacityStats,
    pub discounts: CapacityStats,
    pub user_status: Vec<Tally>,
    pub pending_requests: u64,
}

/// Read-only aggregates for the admin dashboard.
pub struct ReportingService {
    inventory: Arc<InventoryDao>,
    redemptions: Arc<RedemptionDao>,
    users: Arc<UserDao>,
    requests: Arc<RegistrationDao>,
    expiring_soon_days: i64,
}

impl ReportingService {
    pub fn new(
        inventory: Arc<InventoryDao>,
        redemptions: Arc<RedemptionDao>,
        users: Arc<UserDao>,
        requests: Arc<RegistrationDao>,
        settings: &RedemptionSettings,
    ) -> Self {
        Self {
            inventory,
            redemptions,
            users,
            requests,
            expiring_soon_days: settings.expiring_soon_days,
        }
    }

    pub async fn dashboard_summary(&self, period: Period) -> ServiceResult<DashboardSummary> {
        let now = Utc::now();
        let (start, end) = period.window(now);
        let year_ago = period::months_back(now, 12);

        let coupons = self.inventory.capacity_stats(ItemType::Coupon).await?;
        let discounts = self.inventory.capacity_stats(ItemType::Discount).await?;
        let summary = SummaryCounters {
            total_coupons: coupons.items,
            total_discounts: discounts.items,
            total_users: self.users.base.count(doc! {}).await?,
            active_users: self
                .users
                .base
                .count(doc! { "status": UserStatus::Active.as_str() })
                .await?,
            pending_requests: self.pending_requests().await?,
            total_redemptions: self.redemptions.base.count(doc! {}).await?,
            available_coupons: coupons.remaining,
            available_discounts: discounts.remaining,
            average_discount: self.redemptions.average_discount().await?,
        };

        let redemptions = &self.redemptions;
        let charts = DashboardCharts {
            redemptions_over_time: aggregate::buckets(
                redemptions
                    .per_period(between("redeemed_at", start, end), DAY_FORMAT)
                    .await?,
            ),
            redemptions_by_category: aggregate::tallies(
                redemptions.tally(doc! {}, "category", Some(TOP_N)).await?,
            ),
            redemptions_by_company: aggregate::tallies(
                redemptions.tally(doc! {}, "company", Some(TOP_N)).await?,
            ),
            redemptions_by_type: aggregate::tallies(
                redemptions.tally(doc! {}, "item_type", None).await?,
            ),
            user_registrations_over_time: aggregate::buckets(
                self.users
                    .approvals_per_period(between("approval_date", start, end), DAY_FORMAT)
                    .await?,
            ),
            users_by_category: aggregate::tallies(self.users.tally("category").await?),
            users_by_service: aggregate::tallies(self.users.tally("service").await?),
            redemption_status_distribution: aggregate::tallies(
                redemptions.tally(doc! {}, "status", None).await?,
            ),
            monthly_redemptions: aggregate::buckets(
                redemptions
                    .per_period(
                        doc! { "redeemed_at": { "$gte": BsonDateTime::from_chrono(year_ago) } },
                        MONTH_FORMAT,
                    )
                    .await?,
            ),
        };

        let recent_redemptions = self.redemptions.recent(RECENT_LIMIT).await?;
        let expiring_soon = self
            .inventory
            .expiring_between(
                ItemType::Coupon,
                BsonDateTime::from_chrono(now),
                BsonDateTime::from_chrono(now + Duration::days(self.expiring_soon_days)),
                RECENT_LIMIT,
            )
            .await?;

        Ok(DashboardSummary {
            period,
            summary,
            charts,
            recent_redemptions,
            expiring_soon,
        })
    }

    pub async fn redemption_analytics(
        &self,
        query: &AnalyticsQuery,
    ) -> ServiceResult<RedemptionAnalytics> {
        let (start, end) = query.range(Utc::now())?;
        let filter = query.to_document(start, end);
        let total = self.redemptions.base.count(filter.clone()).await?;
        let time_series = aggregate::buckets(self.redemptions.per_period(filter, DAY_FORMAT).await?);

        Ok(RedemptionAnalytics {
            start_date: start,
            end_date: end,
            total,
            time_series,
        })
    }

    pub async fn user_analytics(&self) -> ServiceResult<UserAnalytics> {
        let user_growth = self.users.approvals_per_period(doc! {}, MONTH_FORMAT).await?;
        let ranked = self.redemptions.top_users(TOP_N).await?;
        let ids: Vec<ObjectId> = ranked.iter().map(|(id, _)| *id).collect();
        let users = self.users.find_by_ids(&ids).await?;

        Ok(UserAnalytics {
            user_growth: aggregate::buckets(user_growth),
            active_users: aggregate::top_users(ranked, &users),
        })
    }

    pub async fn summary_report(&self) -> ServiceResult<SummaryReport> {
        Ok(SummaryReport {
            coupons: self.inventory.capacity_stats(ItemType::Coupon).await?,
            discounts: self.inventory.capacity_stats(ItemType::Discount).await?,
            user_status: aggregate::tallies(self.users.tally("status").await?),
            pending_requests: self.pending_requests().await?,
        })
    }

    /// Redemption rows for export, newest first.
    pub async fn redemptions_for_export(&self, query: &AnalyticsQuery) -> ServiceResult<Vec<Redemption>> {
        let filter = if query.start_date.is_none() && query.end_date.is_none() {
            query.field_filter()
        } else {
            let (start, end) = query.range(Utc::now())?;
            query.to_document(start, end)
        };
        Ok(self.redemptions.find(filter).await?)
    }

    async fn pending_requests(&self) -> ServiceResult<u64> {
        Ok(self
            .requests
            .base
            .count(doc! { "status": RequestStatus::Pending.as_str() })
            .await?)
    }
}

/// `field` within `[start, end]`.
fn between(field: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Document {
    doc! {
        field: {
            "$gte": BsonDateTime::from_chrono(start),
            "$lte": BsonDateTime::from_chrono(end),
        }
    }
}

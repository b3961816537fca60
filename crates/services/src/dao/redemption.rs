use bson::{doc, oid::ObjectId, DateTime, Document};
use buddyperks_db::models::{Redemption, RedemptionStatus};
use mongodb::Database;

use super::base::{
    date_bucket_pipeline, float_field, int_field, tally_pipeline, BaseDao, DaoResult,
    PaginatedResult, PaginationParams,
};

pub struct RedemptionDao {
    pub base: BaseDao<Redemption>,
}

impl RedemptionDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Redemption::COLLECTION),
        }
    }

    pub async fn record(&self, redemption: &Redemption) -> DaoResult<Redemption> {
        let id = self.base.insert_one(redemption).await?;
        let mut stored = redemption.clone();
        stored.id = Some(id);
        Ok(stored)
    }

    pub async fn list_for_user(
        &self,
        user_id: ObjectId,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<Redemption>> {
        self.base
            .find_paginated(
                doc! { "user_id": user_id },
                Some(doc! { "redeemed_at": -1 }),
                params,
            )
            .await
    }

    pub async fn find(&self, filter: Document) -> DaoResult<Vec<Redemption>> {
        self.base
            .find_many(filter, Some(doc! { "redeemed_at": -1 }))
            .await
    }

    pub async fn recent(&self, limit: i64) -> DaoResult<Vec<Redemption>> {
        self.base
            .find_limited(doc! {}, doc! { "redeemed_at": -1 }, limit)
            .await
    }

    /// Forward-only status move; `from` guards against skipping states.
    pub async fn transition(
        &self,
        id: ObjectId,
        from: RedemptionStatus,
        to: RedemptionStatus,
    ) -> DaoResult<bool> {
        let result = self
            .base
            .collection()
            .update_one(
                doc! { "_id": id, "status": from.as_str() },
                doc! { "$set": { "status": to.as_str() } },
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    pub async fn expire_due(&self, now: DateTime) -> DaoResult<u64> {
        self.base
            .update_many(
                doc! {
                    "status": RedemptionStatus::Active.as_str(),
                    "expiry_date": { "$lt": now },
                },
                doc! { "$set": { "status": RedemptionStatus::Expired.as_str() } },
            )
            .await
    }

    /// Number of facts per inventory item, keyed by item id.
    pub async fn count_by_item(&self) -> DaoResult<Vec<(ObjectId, i64)>> {
        let rows = self
            .base
            .aggregate(vec![doc! {
                "$group": { "_id": "$inventory_item_id", "count": { "$sum": 1 } }
            }])
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| Some((row.get_object_id("_id").ok()?, int_field(&row, "count"))))
            .collect())
    }

    /// Facts per value of `field`. `category` is an array and counts once
    /// per entry.
    pub async fn tally(
        &self,
        filter: Document,
        field: &str,
        limit: Option<i64>,
    ) -> DaoResult<Vec<(String, u64)>> {
        self.base
            .group_counts(tally_pipeline(filter, field, field == "category", limit))
            .await
    }

    /// Facts per `redeemed_at` bucket, oldest first.
    pub async fn per_period(&self, filter: Document, format: &str) -> DaoResult<Vec<(String, u64)>> {
        self.base
            .group_counts(date_bucket_pipeline(filter, "redeemed_at", format))
            .await
    }

    pub async fn average_discount(&self) -> DaoResult<f64> {
        let rows = self
            .base
            .aggregate(vec![doc! {
                "$group": { "_id": null, "average": { "$avg": "$discount_percentage" } }
            }])
            .await?;
        Ok(rows.first().map_or(0.0, |row| float_field(row, "average")))
    }

    /// The `limit` users with the most facts, ties by id.
    pub async fn top_users(&self, limit: i64) -> DaoResult<Vec<(ObjectId, u64)>> {
        let rows = self
            .base
            .aggregate(tally_pipeline(doc! {}, "user_id", false, Some(limit)))
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id = row.get_object_id("_id").ok()?;
                Some((id, u64::try_from(int_field(&row, "count")).unwrap_or(0)))
            })
            .collect())
    }
}

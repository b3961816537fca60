use bson::{doc, oid::ObjectId, DateTime, Document};
use buddyperks_db::models::{Capacity, ClaimUnit, InventoryItem, ItemType};
use mongodb::{Database, options::ReturnDocument};
use serde::Serialize;
use tracing::debug;

use super::base::{
    float_field, int_field, BaseDao, DaoResult, PaginatedResult, PaginationParams,
    map_write_error,
};

pub struct InventoryDao {
    pub base: BaseDao<InventoryItem>,
}

/// Filter fragment matching items that still have at least one unit.
pub fn has_capacity() -> Document {
    doc! {
        "$or": [
            {
                "capacity.kind": "code_based",
                "capacity.codes": { "$elemMatch": { "is_used": false } },
            },
            {
                "capacity.kind": "counter_based",
                "capacity.remaining_count": { "$gt": 0 },
            },
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CapacityStats {
    pub items: u64,
    pub total: i64,
    pub remaining: i64,
    /// Mean of `consumed / total` over items with any capacity.
    pub redemption_rate: f64,
}

/// Capacity totals for one item type, computed the same way as
/// `Capacity::total` and `Capacity::remaining`.
pub fn capacity_pipeline(item_type: ItemType) -> Vec<Document> {
    let is_codes = doc! { "$eq": ["$capacity.kind", "code_based"] };
    let codes = doc! { "$ifNull": ["$capacity.codes", []] };
    vec![
        doc! { "$match": { "item_type": item_type.as_str() } },
        doc! {
            "$project": {
                "total": {
                    "$cond": [is_codes.clone(), { "$size": codes.clone() }, "$capacity.total_count"]
                },
                "remaining": {
                    "$cond": [
                        is_codes,
                        { "$size": { "$filter": {
                            "input": codes,
                            "cond": { "$ne": ["$$this.is_used", true] },
                        } } },
                        { "$max": ["$capacity.remaining_count", 0] },
                    ]
                },
            }
        },
        doc! {
            "$group": {
                "_id": null,
                "items": { "$sum": 1 },
                "total": { "$sum": "$total" },
                "remaining": { "$sum": "$remaining" },
                "redemption_rate": { "$avg": { "$cond": [
                    { "$gt": ["$total", 0] },
                    { "$divide": [{ "$subtract": ["$total", "$remaining"] }, "$total"] },
                    null,
                ] } },
            }
        },
    ]
}

impl InventoryDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, InventoryItem::COLLECTION),
        }
    }

    pub async fn create(&self, item: InventoryItem) -> DaoResult<InventoryItem> {
        let id = self.base.insert_one(&item).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_typed(&self, id: ObjectId, item_type: ItemType) -> DaoResult<InventoryItem> {
        self.base
            .find_one(doc! { "_id": id, "item_type": item_type.as_str() })
            .await?
            .ok_or(super::base::DaoError::NotFound)
    }

    pub async fn list(&self, filter: Document) -> DaoResult<Vec<InventoryItem>> {
        self.base
            .find_many(filter, Some(doc! { "start_date": -1 }))
            .await
    }

    pub async fn list_paginated(
        &self,
        filter: Document,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<InventoryItem>> {
        self.base
            .find_paginated(filter, Some(doc! { "start_date": -1 }), params)
            .await
    }

    /// Consume one unit of `item` with a single conditional write.
    ///
    /// The filter re-asserts type, validity and capacity, so a concurrent
    /// claim that took the last unit (or an expiry in between) makes this
    /// return `None` instead of overdrawing. For code-based items the
    /// positional `$` targets the first unused code in stored order; the
    /// pre-image tells us which one that was.
    pub async fn try_claim(
        &self,
        item: &InventoryItem,
        now: DateTime,
    ) -> DaoResult<Option<ClaimUnit>> {
        let Some(id) = item.id else {
            return Ok(None);
        };

        let mut filter = doc! {
            "_id": id,
            "item_type": item.item_type.as_str(),
            "end_date": { "$gt": now },
        };

        let update = match &item.capacity {
            Capacity::CodeBased { .. } => {
                filter.insert("capacity.kind", "code_based");
                filter.insert(
                    "capacity.codes",
                    doc! { "$elemMatch": { "is_used": false } },
                );
                doc! {
                    "$set": {
                        "capacity.codes.$.is_used": true,
                        "updated_at": now,
                    }
                }
            }
            Capacity::CounterBased { .. } => {
                filter.insert("capacity.kind", "counter_based");
                filter.insert("capacity.remaining_count", doc! { "$gt": 0 });
                doc! {
                    "$inc": { "capacity.remaining_count": -1_i64 },
                    "$set": { "updated_at": now },
                }
            }
        };

        let before = self
            .base
            .collection()
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::Before)
            .await
            .map_err(map_write_error)?;

        let unit = before.and_then(|doc| doc.capacity.next_unit());
        debug!(item_id = %id, ?unit, "Conditional claim applied");
        Ok(unit)
    }

    /// Update descriptive fields only; capacity is never touched here.
    pub async fn update_details(&self, id: ObjectId, set: Document) -> DaoResult<bool> {
        if set.is_empty() {
            return Ok(self.base.count(doc! { "_id": id }).await? > 0);
        }
        self.base.update_by_id(id, doc! { "$set": set }).await
    }

    pub async fn delete(&self, id: ObjectId) -> DaoResult<bool> {
        self.base.delete_by_id(id).await
    }

    /// Items of `item_type` whose window closes within `(now, until]`.
    pub async fn expiring_between(
        &self,
        item_type: ItemType,
        now: DateTime,
        until: DateTime,
        limit: i64,
    ) -> DaoResult<Vec<InventoryItem>> {
        self.base
            .find_limited(
                doc! {
                    "item_type": item_type.as_str(),
                    "end_date": { "$gte": now, "$lte": until },
                },
                doc! { "end_date": 1 },
                limit,
            )
            .await
    }

    pub async fn capacity_stats(&self, item_type: ItemType) -> DaoResult<CapacityStats> {
        let rows = self.base.aggregate(capacity_pipeline(item_type)).await?;
        Ok(rows.first().map_or_else(CapacityStats::default, |row| CapacityStats {
            items: u64::try_from(int_field(row, "items")).unwrap_or(0),
            total: int_field(row, "total"),
            remaining: int_field(row, "remaining"),
            redemption_rate: float_field(row, "redemption_rate"),
        }))
    }

    pub async fn all(&self) -> DaoResult<Vec<InventoryItem>> {
        self.base.find_many(doc! {}, None).await
    }
}

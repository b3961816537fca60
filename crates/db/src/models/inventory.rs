use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// A coupon or discount offer with bounded redemption capacity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub item_type: ItemType,
    /// Product name shown to redeemers.
    pub name: String,
    pub description: String,
    pub discount_percent: f64,
    pub start_date: DateTime,
    pub end_date: DateTime,
    #[serde(default)]
    pub category: Vec<String>,
    pub company: String,
    #[serde(default)]
    pub product_tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_recommended: bool,
    pub capacity: Capacity,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Coupon,
    Discount,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Coupon => "coupon",
            ItemType::Discount => "discount",
        }
    }
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the remaining redemption capacity of an item is represented.
///
/// Stored under `capacity` with a `kind` discriminator so queries can target
/// `capacity.codes` or `capacity.remaining_count` directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Capacity {
    CodeBased { codes: Vec<CouponCode> },
    CounterBased { remaining_count: i64, total_count: i64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CouponCode {
    pub code: String,
    #[serde(default)]
    pub is_used: bool,
}

/// One unit of capacity selected for a claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimUnit {
    Code { index: usize, code: String },
    Counter { remaining_before: i64 },
}

impl Capacity {
    pub fn codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Capacity::CodeBased {
            codes: codes
                .into_iter()
                .map(|c| CouponCode {
                    code: c.into(),
                    is_used: false,
                })
                .collect(),
        }
    }

    pub fn counter(total: i64) -> Self {
        Capacity::CounterBased {
            remaining_count: total,
            total_count: total,
        }
    }

    pub fn remaining(&self) -> i64 {
        match self {
            Capacity::CodeBased { codes } => codes.iter().filter(|c| !c.is_used).count() as i64,
            Capacity::CounterBased {
                remaining_count, ..
            } => (*remaining_count).max(0),
        }
    }

    pub fn total(&self) -> i64 {
        match self {
            Capacity::CodeBased { codes } => codes.len() as i64,
            Capacity::CounterBased { total_count, .. } => *total_count,
        }
    }

    /// Units already consumed by claims.
    pub fn consumed(&self) -> i64 {
        self.total() - self.remaining()
    }

    /// The unit the next claim would take: the first unused code in stored
    /// order, or the counter when it is still positive.
    pub fn next_unit(&self) -> Option<ClaimUnit> {
        match self {
            Capacity::CodeBased { codes } => codes
                .iter()
                .position(|c| !c.is_used)
                .map(|index| ClaimUnit::Code {
                    index,
                    code: codes[index].code.clone(),
                }),
            Capacity::CounterBased {
                remaining_count, ..
            } if *remaining_count > 0 => Some(ClaimUnit::Counter {
                remaining_before: *remaining_count,
            }),
            Capacity::CounterBased { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Capacity::CodeBased { .. } => "code_based",
            Capacity::CounterBased { .. } => "counter_based",
        }
    }
}

impl InventoryItem {
    pub const COLLECTION: &'static str = "inventory_items";

    pub fn is_expired(&self, now: DateTime) -> bool {
        now >= self.end_date
    }
}

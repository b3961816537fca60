use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::inventory::ItemType;

/// Historical record of one successful claim. Snapshot fields are copied at
/// claim time and never rewritten; only `status` moves forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Redemption {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub item_type: ItemType,
    pub inventory_item_id: ObjectId,
    pub claimed_code: Option<String>,
    pub user_id: ObjectId,
    pub buddy_id: String,
    pub user_snapshot: UserSnapshot,
    pub company: String,
    pub product_name: String,
    pub discount_percentage: f64,
    #[serde(default)]
    pub category: Vec<String>,
    pub redeemed_at: DateTime,
    pub expiry_date: DateTime,
    #[serde(default)]
    pub status: RedemptionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSnapshot {
    pub name: String,
    pub email: String,
    pub category: String,
    pub service: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    #[default]
    Active,
    Used,
    Expired,
}

impl RedemptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedemptionStatus::Active => "active",
            RedemptionStatus::Used => "used",
            RedemptionStatus::Expired => "expired",
        }
    }
}

impl Redemption {
    pub const COLLECTION: &'static str = "redemptions";
}

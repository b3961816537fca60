use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

pub const MAX_BUDDY_CREDIT: i32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: String,
    pub service: String,
    pub category: String,
    pub documents: DocumentRef,
    pub buddy_id: String,
    #[serde(default = "default_buddy_credit")]
    pub buddy_credit: i32,
    pub approval_date: DateTime,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub is_banned: bool,
    pub ban_reason: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Pointer to a file held by external object storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentRef {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Active,
    Banned,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Banned => "banned",
        }
    }
}

fn default_buddy_credit() -> i32 {
    MAX_BUDDY_CREDIT
}

impl User {
    pub const COLLECTION: &'static str = "users";

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

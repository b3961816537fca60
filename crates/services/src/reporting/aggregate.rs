//! Shapes grouped rows from the database into report types.

use std::collections::HashMap;

use bson::oid::ObjectId;
use buddyperks_db::models::User;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Tally {
    pub key: String,
    pub count: u64,
}

/// One time bucket: `YYYY-MM-DD` for days, `YYYY-MM` for months.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Bucket {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActiveUser {
    pub user_id: String,
    pub redemptions: u64,
    pub email: Option<String>,
    pub name: Option<String>,
}

pub fn tallies(rows: Vec<(String, u64)>) -> Vec<Tally> {
    rows.into_iter()
        .map(|(key, count)| Tally { key, count })
        .collect()
}

pub fn buckets(rows: Vec<(String, u64)>) -> Vec<Bucket> {
    rows.into_iter()
        .map(|(label, count)| Bucket { label, count })
        .collect()
}

/// Attach contact details to ranked `(user_id, count)` rows, keeping rank
/// order. Users deleted since keep their count but lose their details.
pub fn top_users(ranked: Vec<(ObjectId, u64)>, users: &[User]) -> Vec<ActiveUser> {
    let by_id: HashMap<ObjectId, &User> = users
        .iter()
        .filter_map(|u| u.id.map(|id| (id, u)))
        .collect();

    ranked
        .into_iter()
        .map(|(id, count)| {
            let user = by_id.get(&id);
            ActiveUser {
                user_id: id.to_hex(),
                redemptions: count,
                email: user.map(|u| u.email.clone()),
                name: user.map(|u| u.full_name()),
            }
        })
        .collect()
}

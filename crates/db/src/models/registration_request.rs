use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::user::DocumentRef;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRequest {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: String,
    pub service: String,
    pub category: String,
    pub document: DocumentRef,
    pub requested_at: DateTime,
    #[serde(default)]
    pub status: RequestStatus,
    pub rejection_reason: Option<String>,
    pub reviewed_at: Option<DateTime>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl RegistrationRequest {
    pub const COLLECTION: &'static str = "registration_requests";
    /// Rejected requests are copied here before the live record is removed.
    pub const REJECTED_COLLECTION: &'static str = "rejected_requests";

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

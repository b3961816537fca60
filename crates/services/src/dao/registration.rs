use bson::{doc, oid::ObjectId, DateTime};
use buddyperks_db::models::{RegistrationRequest, RequestStatus};
use mongodb::{Database, options::ReturnDocument};

use super::base::{BaseDao, DaoError, DaoResult, map_write_error};

pub struct RegistrationDao {
    pub base: BaseDao<RegistrationRequest>,
    pub rejected: BaseDao<RegistrationRequest>,
}

impl RegistrationDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, RegistrationRequest::COLLECTION),
            rejected: BaseDao::new(db, RegistrationRequest::REJECTED_COLLECTION),
        }
    }

    pub async fn create(&self, request: RegistrationRequest) -> DaoResult<RegistrationRequest> {
        let id = self.base.insert_one(&request).await?;
        self.base.find_by_id(id).await
    }

    pub async fn email_exists(&self, email: &str) -> DaoResult<bool> {
        Ok(self.base.count(doc! { "email": email }).await? > 0)
    }

    pub async fn list_by_status(&self, status: RequestStatus) -> DaoResult<Vec<RegistrationRequest>> {
        self.base
            .find_many(
                doc! { "status": status.as_str() },
                Some(doc! { "requested_at": -1 }),
            )
            .await
    }

    pub async fn list_rejected(&self) -> DaoResult<Vec<RegistrationRequest>> {
        self.rejected
            .find_many(doc! {}, Some(doc! { "reviewed_at": -1 }))
            .await
    }

    /// Atomically move a request out of `pending`. Only one caller can win;
    /// everyone else sees `NotFound`. Returns the request after the move.
    pub async fn resolve(
        &self,
        id: ObjectId,
        to: RequestStatus,
        rejection_reason: Option<String>,
    ) -> DaoResult<RegistrationRequest> {
        self.base
            .collection()
            .find_one_and_update(
                doc! { "_id": id, "status": RequestStatus::Pending.as_str() },
                doc! {
                    "$set": {
                        "status": to.as_str(),
                        "rejection_reason": rejection_reason,
                        "reviewed_at": DateTime::now(),
                    }
                },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_write_error)?
            .ok_or(DaoError::NotFound)
    }

    /// Put a resolved request back to `pending` after a failed follow-up step.
    pub async fn reopen(&self, id: ObjectId) -> DaoResult<bool> {
        let result = self
            .base
            .collection()
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$set": {
                        "status": RequestStatus::Pending.as_str(),
                        "rejection_reason": bson::Bson::Null,
                        "reviewed_at": bson::Bson::Null,
                    }
                },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    pub async fn archive_rejected(&self, request: &RegistrationRequest) -> DaoResult<ObjectId> {
        self.rejected.insert_one(request).await
    }

    pub async fn remove(&self, id: ObjectId) -> DaoResult<bool> {
        self.base.delete_by_id(id).await
    }
}

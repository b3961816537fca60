use bson::{doc, oid::ObjectId, Document};
use buddyperks_db::models::{User, UserStatus};
use mongodb::Database;

use super::base::{date_bucket_pipeline, tally_pipeline, BaseDao, DaoError, DaoResult};

pub struct UserDao {
    pub base: BaseDao<User>,
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
        }
    }

    pub async fn create(&self, user: User) -> DaoResult<User> {
        let id = self.base.insert_one(&user).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> DaoResult<User> {
        self.base
            .find_one(doc! { "email": email })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn email_exists(&self, email: &str) -> DaoResult<bool> {
        Ok(self.base.count(doc! { "email": email }).await? > 0)
    }

    pub async fn list(&self) -> DaoResult<Vec<User>> {
        self.base
            .find_many(doc! {}, Some(doc! { "approval_date": -1 }))
            .await
    }

    pub async fn find_by_ids(&self, ids: &[ObjectId]) -> DaoResult<Vec<User>> {
        self.base
            .find_many(doc! { "_id": { "$in": ids.to_vec() } }, None)
            .await
    }

    /// Users per value of `field`, most frequent first.
    pub async fn tally(&self, field: &str) -> DaoResult<Vec<(String, u64)>> {
        self.base
            .group_counts(tally_pipeline(doc! {}, field, false, None))
            .await
    }

    /// Approvals per `approval_date` bucket, oldest first.
    pub async fn approvals_per_period(
        &self,
        filter: Document,
        format: &str,
    ) -> DaoResult<Vec<(String, u64)>> {
        self.base
            .group_counts(date_bucket_pipeline(filter, "approval_date", format))
            .await
    }

    pub async fn set_ban(
        &self,
        user_id: ObjectId,
        status: UserStatus,
        reason: Option<String>,
    ) -> DaoResult<bool> {
        self.base
            .update_by_id(
                user_id,
                doc! {
                    "$set": {
                        "status": status.as_str(),
                        "is_banned": status == UserStatus::Banned,
                        "ban_reason": reason,
                    }
                },
            )
            .await
    }

    pub async fn set_buddy_credit(&self, user_id: ObjectId, credit: i32) -> DaoResult<bool> {
        self.base
            .update_by_id(user_id, doc! { "$set": { "buddy_credit": credit } })
            .await
    }

    /// Removes the user and returns the deleted record.
    pub async fn delete(&self, user_id: ObjectId) -> DaoResult<User> {
        self.base
            .collection()
            .find_one_and_delete(doc! { "_id": user_id })
            .await?
            .ok_or(DaoError::NotFound)
    }
}

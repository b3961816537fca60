use std::sync::Arc;

use bson::oid::ObjectId;
use buddyperks_db::models::{User, UserStatus, MAX_BUDDY_CREDIT};
use tracing::info;

use crate::dao::user::UserDao;
use crate::error::{DaoResultExt, ServiceError, ServiceResult};
use crate::notify::{Notification, NotificationEvent, Notifier};

/// Ban, unban and delete user accounts.
pub struct AccountService {
    users: Arc<UserDao>,
    notifier: Notifier,
}

impl AccountService {
    pub fn new(users: Arc<UserDao>, notifier: Notifier) -> Self {
        Self { users, notifier }
    }

    pub async fn list_users(&self) -> ServiceResult<Vec<User>> {
        Ok(self.users.list().await?)
    }

    pub async fn get(&self, user_id: ObjectId) -> ServiceResult<User> {
        self.users.base.find_by_id(user_id).await.or_not_found("User")
    }

    pub async fn ban(&self, user_id: ObjectId, reason: String) -> ServiceResult<User> {
        let reason = reason.trim().to_string();
        if reason.is_empty() {
            return Err(ServiceError::Validation("a ban reason is required".to_string()));
        }

        let user = self
            .set_status(user_id, UserStatus::Banned, Some(reason.clone()))
            .await?;
        info!(%user_id, %reason, "User banned");
        self.notifier.notify(Notification::new(
            user.email.clone(),
            user.full_name(),
            NotificationEvent::Banned { reason },
        ));
        Ok(user)
    }

    pub async fn unban(&self, user_id: ObjectId) -> ServiceResult<User> {
        let user = self.set_status(user_id, UserStatus::Active, None).await?;
        info!(%user_id, "User unbanned");
        self.notifier.notify(Notification::new(
            user.email.clone(),
            user.full_name(),
            NotificationEvent::Unbanned,
        ));
        Ok(user)
    }

    /// Permanent. Redemption facts keep their snapshot of the user.
    pub async fn delete(&self, user_id: ObjectId) -> ServiceResult<()> {
        let user = self.users.delete(user_id).await.or_not_found("User")?;
        info!(%user_id, email = %user.email, "User deleted");
        self.notifier.notify(Notification::new(
            user.email.clone(),
            user.full_name(),
            NotificationEvent::Deleted,
        ));
        Ok(())
    }

    pub async fn set_buddy_credit(&self, user_id: ObjectId, credit: i32) -> ServiceResult<User> {
        if !(0..=MAX_BUDDY_CREDIT).contains(&credit) {
            return Err(ServiceError::Validation(format!(
                "buddy credit must be between 0 and {MAX_BUDDY_CREDIT}"
            )));
        }
        if !self.users.set_buddy_credit(user_id, credit).await? {
            return Err(ServiceError::not_found("User"));
        }
        info!(%user_id, credit, "Buddy credit updated");
        self.get(user_id).await
    }

    async fn set_status(
        &self,
        user_id: ObjectId,
        status: UserStatus,
        reason: Option<String>,
    ) -> ServiceResult<User> {
        if !self.users.set_ban(user_id, status, reason).await? {
            return Err(ServiceError::not_found("User"));
        }
        self.get(user_id).await
    }
}

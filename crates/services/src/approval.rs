use std::sync::Arc;

use bson::{oid::ObjectId, DateTime};
use buddyperks_db::models::{DocumentRef, RegistrationRequest, RequestStatus, User, UserStatus};
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use crate::auth::AuthService;
use crate::dao::{base::DaoError, registration::RegistrationDao, user::UserDao};
use crate::error::{DaoResultExt, ServiceError, ServiceResult};
use crate::notify::{Notification, NotificationEvent, Notifier};

const BUDDY_ID_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegistrationForm {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1))]
    pub phone_number: String,
    #[validate(length(min = 1))]
    pub service: String,
    #[validate(length(min = 1))]
    pub category: String,
    #[validate(length(min = 1))]
    pub document_name: String,
    #[validate(url)]
    pub document_url: String,
}

/// What an admin sees when listing requests by status. Approved requests no
/// longer exist as requests; they are the users they became.
#[derive(Debug, Clone)]
pub enum RequestListing {
    Requests(Vec<RegistrationRequest>),
    Users(Vec<User>),
}

pub struct ApprovalService {
    requests: Arc<RegistrationDao>,
    users: Arc<UserDao>,
    auth: Arc<AuthService>,
    notifier: Notifier,
    default_credit: i32,
}

impl ApprovalService {
    pub fn new(
        requests: Arc<RegistrationDao>,
        users: Arc<UserDao>,
        auth: Arc<AuthService>,
        notifier: Notifier,
        default_credit: i32,
    ) -> Self {
        Self {
            requests,
            users,
            auth,
            notifier,
            default_credit,
        }
    }

    pub async fn submit(&self, form: RegistrationForm) -> ServiceResult<RegistrationRequest> {
        form.validate()?;
        let email = form.email.trim().to_lowercase();

        if self.users.email_exists(&email).await? || self.requests.email_exists(&email).await? {
            return Err(ServiceError::Conflict("Email already registered".to_string()));
        }

        let password_hash = self
            .auth
            .hash_password(&form.password)
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;

        let request = self
            .requests
            .create(RegistrationRequest {
                id: None,
                first_name: form.first_name,
                last_name: form.last_name,
                email,
                password_hash,
                phone_number: form.phone_number,
                service: form.service,
                category: form.category,
                document: DocumentRef {
                    name: form.document_name,
                    url: form.document_url,
                },
                requested_at: DateTime::now(),
                status: RequestStatus::Pending,
                rejection_reason: None,
                reviewed_at: None,
            })
            .await?;

        info!(request_id = ?request.id, email = %request.email, "Registration request submitted");
        self.notifier.notify(Notification::new(
            request.email.clone(),
            request.full_name(),
            NotificationEvent::Registered,
        ));
        Ok(request)
    }

    /// `pending -> approved`, promoting the request into a user.
    pub async fn approve(&self, request_id: ObjectId) -> ServiceResult<User> {
        let request = self
            .requests
            .resolve(request_id, RequestStatus::Approved, None)
            .await
            .or_not_found("Registration request")?;

        let user = match self.promote(&request).await {
            Ok(user) => user,
            Err(e) => {
                warn!(%request_id, error = %e, "User creation failed, reopening request");
                if let Err(reopen) = self.requests.reopen(request_id).await {
                    warn!(%request_id, error = %reopen, "Could not reopen request");
                }
                return Err(e);
            }
        };

        if let Err(e) = self.requests.remove(request_id).await {
            warn!(%request_id, error = %e, "Approved request was not removed");
        }

        info!(%request_id, user_id = ?user.id, buddy_id = %user.buddy_id, "Registration approved");
        self.notifier.notify(Notification::new(
            user.email.clone(),
            user.full_name(),
            NotificationEvent::Approved {
                buddy_id: user.buddy_id.clone(),
            },
        ));
        Ok(user)
    }

    async fn promote(&self, request: &RegistrationRequest) -> ServiceResult<User> {
        let now = DateTime::now();
        for _ in 0..BUDDY_ID_ATTEMPTS {
            let user = User {
                id: None,
                first_name: request.first_name.clone(),
                last_name: request.last_name.clone(),
                email: request.email.clone(),
                password_hash: request.password_hash.clone(),
                phone_number: request.phone_number.clone(),
                service: request.service.clone(),
                category: request.category.clone(),
                documents: request.document.clone(),
                buddy_id: new_buddy_id(),
                buddy_credit: self.default_credit,
                approval_date: now,
                status: UserStatus::Active,
                is_banned: false,
                ban_reason: None,
                created_at: now,
                updated_at: now,
            };

            match self.users.create(user).await {
                Ok(user) => return Ok(user),
                Err(DaoError::DuplicateKey(msg)) if msg.contains("buddy_id") => {
                    warn!("Buddy id collision, generating another");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(ServiceError::Upstream(
            "could not allocate a unique buddy id".to_string(),
        ))
    }

    /// `pending -> rejected`. The rejected copy is archived and the live
    /// request removed, so the same email can register again.
    pub async fn reject(&self, request_id: ObjectId, reason: String) -> ServiceResult<()> {
        let reason = reason.trim().to_string();
        if reason.is_empty() {
            return Err(ServiceError::Validation(
                "a rejection reason is required".to_string(),
            ));
        }

        let request = self
            .requests
            .resolve(request_id, RequestStatus::Rejected, Some(reason.clone()))
            .await
            .or_not_found("Registration request")?;

        if let Err(e) = self.requests.archive_rejected(&request).await {
            warn!(%request_id, error = %e, "Archiving rejected request failed, reopening request");
            if let Err(reopen) = self.requests.reopen(request_id).await {
                warn!(%request_id, error = %reopen, "Could not reopen request");
            }
            return Err(e.into());
        }
        if let Err(e) = self.requests.remove(request_id).await {
            warn!(%request_id, error = %e, "Rejected request was not removed");
        }

        info!(%request_id, email = %request.email, "Registration rejected");
        self.notifier.notify(Notification::new(
            request.email.clone(),
            request.full_name(),
            NotificationEvent::Rejected { reason },
        ));
        Ok(())
    }

    pub async fn list(&self, status: RequestStatus) -> ServiceResult<RequestListing> {
        Ok(match status {
            RequestStatus::Pending => {
                RequestListing::Requests(self.requests.list_by_status(RequestStatus::Pending).await?)
            }
            RequestStatus::Approved => RequestListing::Users(self.users.list().await?),
            RequestStatus::Rejected => RequestListing::Requests(self.requests.list_rejected().await?),
        })
    }
}

fn new_buddy_id() -> String {
    const ALPHABET: [char; 36] = [
        '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H',
        'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
    ];
    format!("BD{}", nanoid::nanoid!(10, &ALPHABET))
}

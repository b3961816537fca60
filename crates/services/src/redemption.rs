//! Claiming inventory capacity and recording redemption facts.
//!
//! A claim is one conditional write against the inventory item followed by
//! one insert of the [`Redemption`] fact. The fact insert is the durability
//! point: if it fails after capacity was consumed, the unit stays consumed
//! and shows up as an orphan in [`RedemptionEngine::reconcile`]. Units are
//! never handed back.

use std::collections::HashMap;
use std::sync::Arc;

use bson::{oid::ObjectId, DateTime};
use buddyperks_config::RedemptionSettings;
use buddyperks_db::models::{
    ClaimUnit, InventoryItem, ItemType, Redemption, RedemptionStatus, User, UserSnapshot,
    UserStatus,
};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::dao::{
    base::{PaginatedResult, PaginationParams},
    inventory::InventoryDao,
    redemption::RedemptionDao,
    user::UserDao,
};
use crate::error::{DaoResultExt, ServiceError, ServiceResult};

#[derive(Debug, Clone)]
pub struct ClaimReceipt {
    pub redemption: Redemption,
    /// The code handed out for code-based items.
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrphanedClaims {
    pub item_id: String,
    pub item_type: ItemType,
    pub name: String,
    pub consumed: i64,
    pub recorded: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub checked_items: usize,
    pub orphans: Vec<OrphanedClaims>,
}

pub struct RedemptionEngine {
    inventory: Arc<InventoryDao>,
    redemptions: Arc<RedemptionDao>,
    users: Arc<UserDao>,
    max_attempts: u32,
}

impl RedemptionEngine {
    pub fn new(
        inventory: Arc<InventoryDao>,
        redemptions: Arc<RedemptionDao>,
        users: Arc<UserDao>,
        settings: &RedemptionSettings,
    ) -> Self {
        Self {
            inventory,
            redemptions,
            users,
            max_attempts: settings.max_claim_attempts.max(1),
        }
    }

    /// Claim one unit of `item_id` for `user_id`.
    pub async fn claim(
        &self,
        item_type: ItemType,
        item_id: ObjectId,
        user_id: ObjectId,
    ) -> ServiceResult<ClaimReceipt> {
        let user = self.users.base.find_by_id(user_id).await.or_not_found("User")?;
        if user.is_banned || user.status == UserStatus::Banned {
            return Err(ServiceError::Forbidden(format!(
                "User is banned: {}",
                user.ban_reason.as_deref().unwrap_or("no reason given")
            )));
        }

        let label = item_label(item_type);
        let subject = format!("{item_type} {item_id}");
        let (item, unit, now) = retry_lost_races(&subject, self.max_attempts, |attempt| async move {
            let item = self
                .inventory
                .find_typed(item_id, item_type)
                .await
                .or_not_found(label)?;

            let now = DateTime::now();
            if item.is_expired(now) {
                return Err(ServiceError::Expired(label.to_string()));
            }
            if item.capacity.next_unit().is_none() {
                return Err(ServiceError::OutOfStock(label.to_string()));
            }

            match self.inventory.try_claim(&item, now).await? {
                Some(unit) => Ok(Some((item, unit, now))),
                None => {
                    debug!(%item_id, attempt, "Claim lost a race, re-validating");
                    Ok(None)
                }
            }
        })
        .await?;

        self.record(&item, &user, unit, now).await
    }

    async fn record(
        &self,
        item: &InventoryItem,
        user: &User,
        unit: ClaimUnit,
        now: DateTime,
    ) -> ServiceResult<ClaimReceipt> {
        let code = match &unit {
            ClaimUnit::Code { code, .. } => Some(code.clone()),
            ClaimUnit::Counter { .. } => None,
        };

        let fact = build_fact(item, user, code.clone(), now)?;

        match self.redemptions.record(&fact).await {
            Ok(redemption) => {
                info!(
                    item_id = %fact.inventory_item_id,
                    item_type = %item.item_type,
                    user_id = %fact.user_id,
                    redemption_id = ?redemption.id,
                    "Redeemed"
                );
                Ok(ClaimReceipt { redemption, code })
            }
            Err(e) => {
                error!(
                    item_id = %fact.inventory_item_id,
                    user_id = %fact.user_id,
                    ?unit,
                    error = %e,
                    "Capacity consumed but redemption fact was not written"
                );
                Err(ServiceError::Upstream(e.to_string()))
            }
        }
    }

    pub async fn list_for_user(
        &self,
        user_id: ObjectId,
        params: &PaginationParams,
    ) -> ServiceResult<PaginatedResult<Redemption>> {
        Ok(self.redemptions.list_for_user(user_id, params).await?)
    }

    /// `active -> used`. Anything else is a disallowed transition.
    pub async fn mark_used(&self, redemption_id: ObjectId) -> ServiceResult<()> {
        let moved = self
            .redemptions
            .transition(redemption_id, RedemptionStatus::Active, RedemptionStatus::Used)
            .await?;
        if moved {
            info!(%redemption_id, "Redemption marked used");
            return Ok(());
        }

        let existing = self
            .redemptions
            .base
            .find_by_id(redemption_id)
            .await
            .or_not_found("Redemption")?;
        Err(ServiceError::Forbidden(format!(
            "redemption is {}, only active redemptions can be used",
            existing.status.as_str()
        )))
    }

    /// Move active facts past their expiry date to `expired`.
    pub async fn expire_due(&self) -> ServiceResult<u64> {
        let expired = self.redemptions.expire_due(DateTime::now()).await?;
        if expired > 0 {
            info!(expired, "Expired redemptions");
        }
        Ok(expired)
    }

    /// Compare consumed capacity with recorded facts for every item.
    pub async fn reconcile(&self) -> ServiceResult<ReconciliationReport> {
        let items = self.inventory.all().await?;
        let counts: HashMap<ObjectId, i64> =
            self.redemptions.count_by_item().await?.into_iter().collect();

        let orphans = find_orphans(&items, &counts);
        for orphan in &orphans {
            warn!(
                item_id = %orphan.item_id,
                consumed = orphan.consumed,
                recorded = orphan.recorded,
                "Consumed capacity without redemption facts"
            );
        }

        Ok(ReconciliationReport {
            checked_items: items.len(),
            orphans,
        })
    }
}

/// Run `attempt` until it wins (`Some`) or fails. `None` means the
/// conditional write lost to a concurrent claim and the state is re-read.
async fn retry_lost_races<T, F, Fut>(
    subject: &str,
    max_attempts: u32,
    mut attempt: F,
) -> ServiceResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ServiceResult<Option<T>>>,
{
    for n in 1..=max_attempts {
        if let Some(won) = attempt(n).await? {
            return Ok(won);
        }
    }

    warn!(subject, attempts = max_attempts, "Claim retries exhausted");
    Err(ServiceError::Upstream(format!(
        "could not claim {subject} after {max_attempts} attempts"
    )))
}

fn item_label(item_type: ItemType) -> &'static str {
    match item_type {
        ItemType::Coupon => "Coupon",
        ItemType::Discount => "Discount",
    }
}

fn build_fact(
    item: &InventoryItem,
    user: &User,
    claimed_code: Option<String>,
    now: DateTime,
) -> ServiceResult<Redemption> {
    let inventory_item_id = item
        .id
        .ok_or_else(|| ServiceError::Upstream("inventory item without id".to_string()))?;
    let user_id = user
        .id
        .ok_or_else(|| ServiceError::Upstream("user without id".to_string()))?;

    Ok(Redemption {
        id: None,
        item_type: item.item_type,
        inventory_item_id,
        claimed_code,
        user_id,
        buddy_id: user.buddy_id.clone(),
        user_snapshot: UserSnapshot {
            name: user.full_name(),
            email: user.email.clone(),
            category: user.category.clone(),
            service: user.service.clone(),
        },
        company: item.company.clone(),
        product_name: item.name.clone(),
        discount_percentage: item.discount_percent,
        category: item.category.clone(),
        redeemed_at: now,
        expiry_date: item.end_date,
        status: RedemptionStatus::Active,
    })
}

fn find_orphans(items: &[InventoryItem], recorded: &HashMap<ObjectId, i64>) -> Vec<OrphanedClaims> {
    items
        .iter()
        .filter_map(|item| {
            let id = item.id?;
            let consumed = item.capacity.consumed();
            let facts = recorded.get(&id).copied().unwrap_or(0);
            (consumed > facts).then(|| OrphanedClaims {
                item_id: id.to_hex(),
                item_type: item.item_type,
                name: item.name.clone(),
                consumed,
                recorded: facts,
            })
        })
        .collect()
}

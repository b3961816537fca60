use std::collections::HashSet;
use std::sync::Arc;

use bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use buddyperks_db::models::{Capacity, InventoryItem, ItemType};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::dao::{
    base::{PaginatedResult, PaginationParams},
    inventory::{has_capacity, InventoryDao},
};
use crate::error::{DaoResultExt, ServiceError, ServiceResult};

/// Listing filter. Every field narrows the result; eligibility (not expired,
/// capacity left) is always applied on top.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryFilter {
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub companies: Vec<String>,
    pub company: Option<String>,
    pub min_discount: Option<f64>,
    pub max_discount: Option<f64>,
    pub is_featured: Option<bool>,
    pub is_recommended: Option<bool>,
    pub product_name: Option<String>,
    pub item_type: Option<ItemType>,
}

impl InventoryFilter {
    pub fn with_type(mut self, item_type: ItemType) -> Self {
        self.item_type = Some(item_type);
        self
    }

    pub fn to_document(&self, now: DateTime) -> ServiceResult<Document> {
        if let (Some(min), Some(max)) = (self.min_discount, self.max_discount) {
            if min > max {
                return Err(ServiceError::Validation(format!(
                    "min_discount {min} is greater than max_discount {max}"
                )));
            }
        }

        let mut clauses = vec![doc! { "end_date": { "$gt": now } }, has_capacity()];

        if let Some(item_type) = self.item_type {
            clauses.push(doc! { "item_type": item_type.as_str() });
        }
        if !self.category.is_empty() {
            clauses.push(doc! { "category": { "$in": self.category.clone() } });
        }
        if !self.companies.is_empty() {
            clauses.push(doc! { "company": { "$in": self.companies.clone() } });
        }
        if let Some(company) = &self.company {
            clauses.push(doc! { "company": company.clone() });
        }

        let mut discount = Document::new();
        if let Some(min) = self.min_discount {
            discount.insert("$gte", min);
        }
        if let Some(max) = self.max_discount {
            discount.insert("$lte", max);
        }
        if !discount.is_empty() {
            clauses.push(doc! { "discount_percent": discount });
        }

        if let Some(featured) = self.is_featured {
            clauses.push(doc! { "is_featured": featured });
        }
        if let Some(recommended) = self.is_recommended {
            clauses.push(doc! { "is_recommended": recommended });
        }
        if let Some(name) = self.product_name.as_deref().map(str::trim) {
            if !name.is_empty() {
                clauses.push(doc! {
                    "product_tags": { "$regex": escape_regex(name), "$options": "i" }
                });
            }
        }

        Ok(doc! { "$and": clauses })
    }
}

/// Match the text literally inside a `$regex`.
fn escape_regex(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(
            c,
            '\\' | '.' | '^' | '$' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct InventoryListing {
    pub items: Vec<InventoryItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub coupons: PaginatedResult<InventoryItem>,
    pub discounts: PaginatedResult<InventoryItem>,
}

/// Descriptive fields shared by coupon and discount creation.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewInventoryItem {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0.0, max = 100.0))]
    pub discount_percent: f64,
    pub start_date: chrono::DateTime<Utc>,
    pub end_date: chrono::DateTime<Utc>,
    #[serde(default)]
    pub category: Vec<String>,
    #[validate(length(min = 1))]
    pub company: String,
    #[serde(default)]
    pub product_tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_recommended: bool,
}

impl NewInventoryItem {
    fn check(&self) -> ServiceResult<()> {
        self.validate()?;
        if self.start_date >= self.end_date {
            return Err(ServiceError::Validation(
                "start_date must be before end_date".to_string(),
            ));
        }
        Ok(())
    }

    fn into_item(self, item_type: ItemType, capacity: Capacity) -> InventoryItem {
        let now = DateTime::now();
        InventoryItem {
            id: None,
            item_type,
            name: self.name,
            description: self.description,
            discount_percent: self.discount_percent,
            start_date: DateTime::from_chrono(self.start_date),
            end_date: DateTime::from_chrono(self.end_date),
            category: self.category,
            company: self.company,
            product_tags: self.product_tags,
            images: self.images,
            is_featured: self.is_featured,
            is_recommended: self.is_recommended,
            capacity,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of descriptive fields. Capacity is not part of it.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct InventoryUpdate {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.0, max = 100.0))]
    pub discount_percent: Option<f64>,
    pub start_date: Option<chrono::DateTime<Utc>>,
    pub end_date: Option<chrono::DateTime<Utc>>,
    pub category: Option<Vec<String>>,
    #[validate(length(min = 1))]
    pub company: Option<String>,
    pub product_tags: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub is_recommended: Option<bool>,
}

impl InventoryUpdate {
    fn to_set(&self) -> Document {
        let mut set = Document::new();
        let strings = |v: &Vec<String>| Bson::Array(v.iter().cloned().map(Bson::String).collect());

        if let Some(v) = &self.name {
            set.insert("name", v.clone());
        }
        if let Some(v) = &self.description {
            set.insert("description", v.clone());
        }
        if let Some(v) = self.discount_percent {
            set.insert("discount_percent", v);
        }
        if let Some(v) = self.start_date {
            set.insert("start_date", DateTime::from_chrono(v));
        }
        if let Some(v) = self.end_date {
            set.insert("end_date", DateTime::from_chrono(v));
        }
        if let Some(v) = &self.category {
            set.insert("category", strings(v));
        }
        if let Some(v) = &self.company {
            set.insert("company", v.clone());
        }
        if let Some(v) = &self.product_tags {
            set.insert("product_tags", strings(v));
        }
        if let Some(v) = &self.images {
            set.insert("images", strings(v));
        }
        if let Some(v) = self.is_featured {
            set.insert("is_featured", v);
        }
        if let Some(v) = self.is_recommended {
            set.insert("is_recommended", v);
        }
        set
    }
}

pub struct InventoryService {
    dao: Arc<InventoryDao>,
}

impl InventoryService {
    pub fn new(dao: Arc<InventoryDao>) -> Self {
        Self { dao }
    }

    /// Redeemable items of one type, newest first.
    pub async fn list(
        &self,
        item_type: ItemType,
        filter: InventoryFilter,
    ) -> ServiceResult<InventoryListing> {
        let query = filter.with_type(item_type).to_document(DateTime::now())?;
        let items = self.dao.list(query).await?;
        let message = items
            .is_empty()
            .then(|| format!("No {item_type}s match the given filters"));
        Ok(InventoryListing { items, message })
    }

    /// Same filter over coupons and discounts, paginated independently.
    pub async fn search(
        &self,
        filter: InventoryFilter,
        params: &PaginationParams,
    ) -> ServiceResult<SearchResults> {
        let now = DateTime::now();
        let coupons = filter.clone().with_type(ItemType::Coupon).to_document(now)?;
        let discounts = filter.with_type(ItemType::Discount).to_document(now)?;

        Ok(SearchResults {
            coupons: self.dao.list_paginated(coupons, params).await?,
            discounts: self.dao.list_paginated(discounts, params).await?,
        })
    }

    pub async fn create_coupon(
        &self,
        item: NewInventoryItem,
        codes: Vec<String>,
    ) -> ServiceResult<InventoryItem> {
        item.check()?;
        let codes: Vec<String> = codes
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if codes.is_empty() {
            return Err(ServiceError::Validation(
                "a coupon needs at least one code".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = codes.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(ServiceError::Validation(format!("duplicate coupon code {dup}")));
        }

        let created = self
            .dao
            .create(item.into_item(ItemType::Coupon, Capacity::codes(codes)))
            .await?;
        info!(item_id = ?created.id, codes = created.capacity.total(), "Coupon created");
        Ok(created)
    }

    pub async fn create_discount(
        &self,
        item: NewInventoryItem,
        total_count: i64,
    ) -> ServiceResult<InventoryItem> {
        item.check()?;
        if total_count < 1 {
            return Err(ServiceError::Validation(
                "total_count must be at least 1".to_string(),
            ));
        }

        let created = self
            .dao
            .create(item.into_item(ItemType::Discount, Capacity::counter(total_count)))
            .await?;
        info!(item_id = ?created.id, total_count, "Discount created");
        Ok(created)
    }

    /// Every item of a type, regardless of eligibility.
    pub async fn list_all(&self, item_type: ItemType) -> ServiceResult<Vec<InventoryItem>> {
        Ok(self
            .dao
            .list(doc! { "item_type": item_type.as_str() })
            .await?)
    }

    pub async fn update(&self, id: ObjectId, update: InventoryUpdate) -> ServiceResult<InventoryItem> {
        update.validate()?;
        let current = self.dao.base.find_by_id(id).await.or_not_found("Inventory item")?;

        let start = update
            .start_date
            .map(DateTime::from_chrono)
            .unwrap_or(current.start_date);
        let end = update
            .end_date
            .map(DateTime::from_chrono)
            .unwrap_or(current.end_date);
        if start >= end {
            return Err(ServiceError::Validation(
                "start_date must be before end_date".to_string(),
            ));
        }

        if !self.dao.update_details(id, update.to_set()).await? {
            return Err(ServiceError::not_found("Inventory item"));
        }
        info!(item_id = %id, "Inventory item updated");
        self.dao.base.find_by_id(id).await.or_not_found("Inventory item")
    }

    pub async fn delete(&self, id: ObjectId) -> ServiceResult<()> {
        if !self.dao.delete(id).await? {
            return Err(ServiceError::not_found("Inventory item"));
        }
        info!(item_id = %id, "Inventory item deleted");
        Ok(())
    }
}

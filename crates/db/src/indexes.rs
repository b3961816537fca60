use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

use crate::models::{InventoryItem, Redemption, RegistrationRequest, User};

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Inventory
    create_indexes(
        db,
        InventoryItem::COLLECTION,
        vec![
            index(bson::doc! { "item_type": 1, "end_date": 1, "start_date": -1 }),
            index(bson::doc! { "item_type": 1, "category": 1 }),
            index(bson::doc! { "item_type": 1, "company": 1 }),
        ],
    )
    .await?;

    // Redemptions
    create_indexes(
        db,
        Redemption::COLLECTION,
        vec![
            index(bson::doc! { "redeemed_at": -1 }),
            index(bson::doc! { "user_id": 1, "redeemed_at": -1 }),
            index(bson::doc! { "inventory_item_id": 1 }),
            index(bson::doc! { "company": 1 }),
            index(bson::doc! { "category": 1 }),
            index(bson::doc! { "status": 1, "expiry_date": 1 }),
        ],
    )
    .await?;

    // Registration requests
    create_indexes(
        db,
        RegistrationRequest::COLLECTION,
        vec![
            index_unique(bson::doc! { "email": 1 }),
            index(bson::doc! { "status": 1, "requested_at": -1 }),
        ],
    )
    .await?;

    create_indexes(
        db,
        RegistrationRequest::REJECTED_COLLECTION,
        vec![index(bson::doc! { "reviewed_at": -1 })],
    )
    .await?;

    // Users
    create_indexes(
        db,
        User::COLLECTION,
        vec![
            index_unique(bson::doc! { "email": 1 }),
            index_unique(bson::doc! { "buddy_id": 1 }),
            index(bson::doc! { "approval_date": -1 }),
        ],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}

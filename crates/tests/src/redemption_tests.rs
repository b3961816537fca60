use std::collections::HashSet;

use bson::{doc, oid::ObjectId};
use buddyperks_db::models::{InventoryItem, Redemption};
use serde_json::{Value, json};

use crate::fixtures::test_app::TestApp;

async fn redeem(app: &TestApp, kind: &str, id: &str, token: &str) -> reqwest::Response {
    app.auth_post(&format!("/api/{kind}/{id}/redeem"), token)
        .send()
        .await
        .unwrap()
}

fn id_of(item: &Value) -> String {
    item["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn coupon_codes_are_handed_out_once() {
    let app = TestApp::spawn().await;
    let user = app.approved_user("codes@test.com").await;
    let coupon = id_of(&app.create_coupon("Pizza", &["A", "B"]).await);

    let mut claimed = Vec::new();
    for _ in 0..2 {
        let resp = redeem(&app, "coupon", &coupon, &user.access_token).await;
        assert_eq!(resp.status().as_u16(), 201);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["redemption"]["buddy_id"], user.buddy_id.as_str());
        assert_eq!(body["redemption"]["status"], "active");
        claimed.push(body["code"].as_str().unwrap().to_string());
    }
    assert_eq!(claimed, vec!["A", "B"]);

    let resp = redeem(&app, "coupon", &coupon, &user.access_token).await;
    assert_eq!(resp.status().as_u16(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "out_of_stock");
}

#[tokio::test]
async fn concurrent_claims_never_oversell_codes() {
    let app = TestApp::spawn().await;
    let user = app.approved_user("race@test.com").await;
    let coupon = id_of(&app.create_coupon("Race", &["X1", "X2", "X3"]).await);

    let attempts = (0..10).map(|_| redeem(&app, "coupon", &coupon, &user.access_token));
    let responses = futures::future::join_all(attempts).await;

    let mut codes = HashSet::new();
    let mut sold_out = 0;
    for resp in responses {
        match resp.status().as_u16() {
            201 => {
                let body: Value = resp.json().await.unwrap();
                codes.insert(body["code"].as_str().unwrap().to_string());
            }
            409 => {
                let body: Value = resp.json().await.unwrap();
                assert_eq!(body["error"], "out_of_stock");
                sold_out += 1;
            }
            other => panic!("unexpected status {other}"),
        }
    }

    assert_eq!(codes.len(), 3);
    assert_eq!(sold_out, 7);

    let facts = app
        .db
        .collection::<Redemption>(Redemption::COLLECTION)
        .count_documents(doc! {})
        .await
        .unwrap();
    assert_eq!(facts, 3);
}

#[tokio::test]
async fn last_discount_unit_goes_to_one_caller() {
    let app = TestApp::spawn().await;
    let first = app.approved_user("first@test.com").await;
    let second = app.approved_user("second@test.com").await;
    let discount = id_of(&app.create_discount("Gym", 1).await);

    let (a, b) = tokio::join!(
        redeem(&app, "discount", &discount, &first.access_token),
        redeem(&app, "discount", &discount, &second.access_token),
    );
    let mut statuses = vec![a.status().as_u16(), b.status().as_u16()];
    statuses.sort();
    assert_eq!(statuses, vec![201, 409]);

    let items: Value = app
        .admin_get("/api/admin/discount")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(items[0]["remaining"], 0);
    assert_eq!(items[0]["total"], 1);
}

#[tokio::test]
async fn discount_claim_has_no_code() {
    let app = TestApp::spawn().await;
    let user = app.approved_user("nocode@test.com").await;
    let discount = id_of(&app.create_discount("Spa", 5).await);

    let resp = redeem(&app, "discount", &discount, &user.access_token).await;
    assert_eq!(resp.status().as_u16(), 201);
    let body: Value = resp.json().await.unwrap();
    assert!(body["code"].is_null());
    assert_eq!(body["redemption"]["item_type"], "discount");
    assert_eq!(body["redemption"]["discount_percentage"], 15.0);
}

#[tokio::test]
async fn banned_user_cannot_claim() {
    let app = TestApp::spawn().await;
    let user = app.approved_user("banned@test.com").await;
    let coupon = id_of(&app.create_coupon("Burger", &["Z"]).await);

    let resp = app
        .admin_post(&format!("/api/admin/user/{}/ban", user.id))
        .json(&json!({ "reason": "abuse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = redeem(&app, "coupon", &coupon, &user.access_token).await;
    assert_eq!(resp.status().as_u16(), 403);

    // Capacity untouched
    let items: Value = app
        .admin_get("/api/admin/coupon")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(items[0]["remaining"], 1);
}

#[tokio::test]
async fn expired_item_is_gone() {
    let app = TestApp::spawn().await;
    let user = app.approved_user("late@test.com").await;
    let coupon = id_of(&app.create_expired_coupon("Old", &["Q"]).await);

    let resp = redeem(&app, "coupon", &coupon, &user.access_token).await;
    assert_eq!(resp.status().as_u16(), 410);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "expired");
}

#[tokio::test]
async fn claiming_through_the_wrong_type_is_not_found() {
    let app = TestApp::spawn().await;
    let user = app.approved_user("wrongtype@test.com").await;
    let discount = id_of(&app.create_discount("Cinema", 3).await);

    let resp = redeem(&app, "coupon", &discount, &user.access_token).await;
    assert_eq!(resp.status().as_u16(), 404);

    let resp = redeem(&app, "coupon", "not-an-id", &user.access_token).await;
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn claiming_requires_login() {
    let app = TestApp::spawn().await;
    let coupon = id_of(&app.create_coupon("Anon", &["N"]).await);

    let resp = app
        .client
        .post(app.url(&format!("/api/coupon/{coupon}/redeem")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn redemption_keeps_snapshot_after_item_changes() {
    let app = TestApp::spawn().await;
    let user = app.approved_user("snap@test.com").await;
    let coupon = id_of(&app.create_coupon("Tacos", &["T1"]).await);

    let resp = redeem(&app, "coupon", &coupon, &user.access_token).await;
    assert_eq!(resp.status().as_u16(), 201);

    let resp = app
        .admin_put(&format!("/api/admin/inventory/{coupon}"))
        .json(&json!({ "name": "Burritos", "discount_percent": 50.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let page: Value = app
        .auth_get("/api/redemption", &user.access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["total"], 1);
    let fact = &page["items"][0];
    assert_eq!(fact["product_name"], "Tacos");
    assert_eq!(fact["discount_percentage"], 20.0);
    assert_eq!(fact["claimed_code"], "T1");
    assert_eq!(fact["user_snapshot"]["email"], "snap@test.com");
}

#[tokio::test]
async fn mark_used_only_from_active() {
    let app = TestApp::spawn().await;
    let user = app.approved_user("use@test.com").await;
    let coupon = id_of(&app.create_coupon("Coffee", &["C1"]).await);

    let body: Value = redeem(&app, "coupon", &coupon, &user.access_token)
        .await
        .json()
        .await
        .unwrap();
    let redemption_id = body["redemption"]["id"].as_str().unwrap().to_string();
    let path = format!("/api/admin/redemption/{redemption_id}/use");

    let resp = app.admin_post(&path).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app.admin_post(&path).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn expire_due_flags_lapsed_redemptions() {
    let app = TestApp::spawn().await;
    let user = app.approved_user("lapse@test.com").await;
    let discount = id_of(&app.create_discount("Bowling", 2).await);
    redeem(&app, "discount", &discount, &user.access_token).await;

    app.db
        .collection::<Redemption>(Redemption::COLLECTION)
        .update_many(
            doc! {},
            doc! { "$set": { "expiry_date": bson::DateTime::from_millis(0) } },
        )
        .await
        .unwrap();

    let body: Value = app
        .admin_post("/api/admin/redemption/expire")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["expired"], 1);

    let page: Value = app
        .auth_get("/api/redemption", &user.access_token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["items"][0]["status"], "expired");
}

#[tokio::test]
async fn reconcile_reports_capacity_without_facts() {
    let app = TestApp::spawn().await;
    let user = app.approved_user("audit@test.com").await;
    let discount = id_of(&app.create_discount("Bikes", 5).await);
    app.create_coupon("Clean", &["K1"]).await;
    redeem(&app, "discount", &discount, &user.access_token).await;

    let report: Value = app
        .admin_get("/api/admin/inventory/reconcile")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["checked_items"], 2);
    assert!(report["orphans"].as_array().unwrap().is_empty());

    // Simulate a claim whose fact write never happened
    let oid = ObjectId::parse_str(&discount).unwrap();
    app.db
        .collection::<InventoryItem>(InventoryItem::COLLECTION)
        .update_one(
            doc! { "_id": oid },
            doc! { "$inc": { "capacity.remaining_count": -1 } },
        )
        .await
        .unwrap();

    let report: Value = app
        .admin_get("/api/admin/inventory/reconcile")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let orphans = report["orphans"].as_array().unwrap();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0]["item_id"], discount.as_str());
    assert_eq!(orphans[0]["consumed"], 2);
    assert_eq!(orphans[0]["recorded"], 1);
}

use chrono::{Duration, Utc};
use serde_json::{Value, json};

use crate::fixtures::{seed::item_body, test_app::TestApp};

async fn list(app: &TestApp, token: &str, path: &str) -> Value {
    let resp = app.auth_get(path, token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200, "GET {path}");
    resp.json().await.unwrap()
}

fn names(listing: &Value) -> Vec<String> {
    listing["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn coupon_listing_filters_by_category_and_discount() {
    let app = TestApp::spawn().await;
    let user = app.approved_user("browse@test.com").await;

    let mut travel = item_body("Flights", 40.0, 30);
    travel["category"] = json!(["travel"]);
    travel["codes"] = json!(["F1"]);
    app.create_item("/api/admin/coupon", travel).await;

    let mut food = item_body("Pasta", 10.0, 30);
    food["codes"] = json!(["P1"]);
    app.create_item("/api/admin/coupon", food).await;

    let all = list(&app, &user.access_token, "/api/coupon").await;
    assert_eq!(all["items"].as_array().unwrap().len(), 2);
    assert!(all.get("message").is_none());

    let travel = list(&app, &user.access_token, "/api/coupon?category=travel,hotels").await;
    assert_eq!(names(&travel), vec!["Flights"]);

    let big = list(&app, &user.access_token, "/api/coupon?min_discount=25").await;
    assert_eq!(names(&big), vec!["Flights"]);

    let none = list(&app, &user.access_token, "/api/coupon?company=Nobody").await;
    assert!(none["items"].as_array().unwrap().is_empty());
    assert_eq!(none["message"], "No coupons match the given filters");
}

#[tokio::test]
async fn listings_are_newest_first_and_hide_ineligible() {
    let app = TestApp::spawn().await;
    let user = app.approved_user("order@test.com").await;
    let now = Utc::now();

    let mut older = item_body("Older", 10.0, 30);
    older["start_date"] = json!(now - Duration::days(3));
    older["total_count"] = json!(5);
    app.create_item("/api/admin/discount", older).await;

    let mut newer = item_body("Newer", 10.0, 30);
    newer["start_date"] = json!(now - Duration::days(1));
    newer["total_count"] = json!(5);
    app.create_item("/api/admin/discount", newer).await;

    let mut lapsed = item_body("Lapsed", 10.0, -1);
    lapsed["start_date"] = json!(now - Duration::days(5));
    lapsed["total_count"] = json!(5);
    app.create_item("/api/admin/discount", lapsed).await;

    let listing = list(&app, &user.access_token, "/api/discount").await;
    assert_eq!(names(&listing), vec!["Newer", "Older"]);

    // Admin view keeps everything
    let all: Value = app
        .admin_get("/api/admin/discount")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn sold_out_items_drop_out_of_listing() {
    let app = TestApp::spawn().await;
    let user = app.approved_user("soldout@test.com").await;
    let coupon = app.create_coupon("Single", &["ONLY"]).await;
    let id = coupon["id"].as_str().unwrap();

    let resp = app
        .auth_post(&format!("/api/coupon/{id}/redeem"), &user.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let listing = list(&app, &user.access_token, "/api/coupon").await;
    assert!(listing["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn inverted_discount_range_is_rejected() {
    let app = TestApp::spawn().await;
    let user = app.approved_user("range@test.com").await;

    let resp = app
        .auth_get("/api/coupon?min_discount=50&max_discount=10", &user.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn listing_requires_login() {
    let app = TestApp::spawn().await;
    let resp = app.client.get(app.url("/api/coupon")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn search_is_public_and_split_by_type() {
    let app = TestApp::spawn().await;
    app.create_coupon("Laptop Sale", &["L1"]).await;
    app.create_discount("Laptop Repair", 4).await;
    app.create_discount("Shoes", 4).await;

    let resp = app
        .client
        .get(app.url("/api/search?product_name=laptop"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["coupons"]["total"], 1);
    assert_eq!(body["coupons"]["items"][0]["name"], "Laptop Sale");
    assert_eq!(body["discounts"]["total"], 1);
    assert_eq!(body["discounts"]["items"][0]["name"], "Laptop Repair");
    assert!(body["coupons"]["items"][0].get("codes").is_none());
}

#[tokio::test]
async fn create_coupon_validates_codes_and_dates() {
    let app = TestApp::spawn().await;

    let mut empty = item_body("Empty", 10.0, 30);
    empty["codes"] = json!([]);
    let resp = app.admin_post("/api/admin/coupon").json(&empty).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 422);

    let mut dup = item_body("Dup", 10.0, 30);
    dup["codes"] = json!(["A", "A"]);
    let resp = app.admin_post("/api/admin/coupon").json(&dup).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 422);

    let mut backwards = item_body("Backwards", 10.0, 30);
    backwards["end_date"] = json!(Utc::now() - Duration::days(30));
    backwards["codes"] = json!(["B"]);
    let resp = app
        .admin_post("/api/admin/coupon")
        .json(&backwards)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);

    let mut zero = item_body("Zero", 10.0, 30);
    zero["total_count"] = json!(0);
    let resp = app.admin_post("/api/admin/discount").json(&zero).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn admin_sees_codes_and_can_delete() {
    let app = TestApp::spawn().await;
    let coupon = app.create_coupon("Visible", &["V1", "V2"]).await;
    assert_eq!(coupon["capacity_kind"], "code_based");
    assert_eq!(coupon["codes"].as_array().unwrap().len(), 2);
    assert_eq!(coupon["remaining"], 2);

    let id = coupon["id"].as_str().unwrap();
    let resp = app
        .admin_delete(&format!("/api/admin/inventory/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let resp = app
        .admin_delete(&format!("/api/admin/inventory/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn update_rejects_inverted_window() {
    let app = TestApp::spawn().await;
    let discount = app.create_discount("Window", 3).await;
    let id = discount["id"].as_str().unwrap();

    let resp = app
        .admin_put(&format!("/api/admin/inventory/{id}"))
        .json(&json!({ "end_date": Utc::now() - Duration::days(2) }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

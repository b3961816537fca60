use bson::{Document, doc, oid::ObjectId};
use buddyperks_db::models::RegistrationRequest;
use serde_json::{Value, json};

use crate::fixtures::{seed::ADMIN_KEY_HEADER, test_app::TestApp};

#[tokio::test]
async fn approve_promotes_request_to_user() {
    let app = TestApp::spawn().await;
    let request_id = app.register_request("approve@test.com").await;

    let resp = app
        .admin_post(&format!("/api/admin/request/{request_id}/approve"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    let user: Value = resp.json().await.unwrap();
    assert_eq!(user["email"], "approve@test.com");
    assert!(user["buddy_id"].as_str().unwrap().starts_with("BD"));
    assert_eq!(user["buddy_credit"], app.settings.redemption.default_buddy_credit);

    let emails = app.mailer.wait_for("approve@test.com", 2).await;
    let approval = emails
        .iter()
        .find(|e| e.body.contains("approved"))
        .expect("approval email");
    assert!(approval.body.contains(user["buddy_id"].as_str().unwrap()));
}

#[tokio::test]
async fn approval_is_one_shot() {
    let app = TestApp::spawn().await;
    let request_id = app.register_request("once@test.com").await;
    let path = format!("/api/admin/request/{request_id}/approve");

    let first = app.admin_post(&path).send().await.unwrap();
    assert_eq!(first.status().as_u16(), 201);

    let second = app.admin_post(&path).send().await.unwrap();
    assert_eq!(second.status().as_u16(), 404);

    let users: Value = app
        .admin_get("/api/admin/user")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn pending_list_excludes_approved() {
    let app = TestApp::spawn().await;
    let approved = app.register_request("in@test.com").await;
    app.register_request("waiting@test.com").await;
    app.admin_post(&format!("/api/admin/request/{approved}/approve"))
        .send()
        .await
        .unwrap();

    let pending: Value = app
        .admin_get("/api/admin/request?status=pending")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["email"], "waiting@test.com");

    let approved: Value = app
        .admin_get("/api/admin/request?status=approved")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let approved = approved.as_array().unwrap();
    assert_eq!(approved.len(), 1);
    assert!(approved[0]["buddy_id"].is_string());
}

#[tokio::test]
async fn reject_archives_and_notifies_with_reason() {
    let app = TestApp::spawn().await;
    let request_id = app.register_request("reject@test.com").await;

    let resp = app
        .admin_post(&format!("/api/admin/request/{request_id}/reject"))
        .json(&json!({ "reason": "incomplete docs" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let rejected: Value = app
        .admin_get("/api/admin/request?status=rejected")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let rejected = rejected.as_array().unwrap();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0]["status"], "rejected");
    assert_eq!(rejected[0]["rejection_reason"], "incomplete docs");

    let pending: Value = app
        .admin_get("/api/admin/request")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(pending.as_array().unwrap().is_empty());

    let users: Value = app
        .admin_get("/api/admin/user")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(users.as_array().unwrap().is_empty());

    let emails = app.mailer.wait_for("reject@test.com", 2).await;
    assert!(emails.iter().any(|e| e.body.contains("incomplete docs")));
}

#[tokio::test]
async fn failed_archive_reopens_request() {
    let app = TestApp::spawn().await;
    let request_id = app.register_request("archive@test.com").await;
    let oid = ObjectId::parse_str(&request_id).unwrap();

    // An archive row with the same _id makes the archive insert collide
    let live = app
        .db
        .collection::<Document>(RegistrationRequest::COLLECTION)
        .find_one(doc! { "_id": oid })
        .await
        .unwrap()
        .unwrap();
    let archive = app
        .db
        .collection::<Document>(RegistrationRequest::REJECTED_COLLECTION);
    archive.insert_one(live).await.unwrap();

    let path = format!("/api/admin/request/{request_id}/reject");
    let resp = app
        .admin_post(&path)
        .json(&json!({ "reason": "expired id" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    let pending: Value = app
        .admin_get("/api/admin/request")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["status"], "pending");
    assert!(pending[0]["rejection_reason"].is_null());

    archive.delete_one(doc! { "_id": oid }).await.unwrap();
    let resp = app
        .admin_post(&path)
        .json(&json!({ "reason": "expired id" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn rejected_email_can_register_again() {
    let app = TestApp::spawn().await;
    let request_id = app.register_request("again@test.com").await;
    app.admin_post(&format!("/api/admin/request/{request_id}/reject"))
        .json(&json!({ "reason": "blurry scan" }))
        .send()
        .await
        .unwrap();

    app.register_request("again@test.com").await;
}

#[tokio::test]
async fn reject_requires_reason() {
    let app = TestApp::spawn().await;
    let request_id = app.register_request("noreason@test.com").await;

    let resp = app
        .admin_post(&format!("/api/admin/request/{request_id}/reject"))
        .json(&json!({ "reason": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);

    let pending: Value = app
        .admin_get("/api/admin/request")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(pending.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn approving_unknown_request_is_not_found() {
    let app = TestApp::spawn().await;

    let resp = app
        .admin_post("/api/admin/request/000000000000000000000000/approve")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    let resp = app
        .admin_post("/api/admin/request/not-an-id/approve")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn admin_routes_require_admin_key() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .get(app.url("/api/admin/request"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    let resp = app
        .client
        .get(app.url("/api/admin/request"))
        .header(ADMIN_KEY_HEADER, "wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn user_token_is_not_an_admin_key() {
    let app = TestApp::spawn().await;
    let user = app.approved_user("sneaky@test.com").await;

    let resp = app
        .auth_get("/api/admin/user", &user.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

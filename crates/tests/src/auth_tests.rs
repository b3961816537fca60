use crate::fixtures::{
    seed::{TEST_PASSWORD, registration_body},
    test_app::TestApp,
};
use serde_json::{Value, json};

#[tokio::test]
async fn register_creates_pending_request() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&registration_body("Pending@Test.com"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 201);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "pending");
    assert_eq!(body["email"], "pending@test.com");
    assert!(body.get("password_hash").is_none());

    let emails = app.mailer.wait_for("pending@test.com", 1).await;
    assert_eq!(emails.len(), 1);
    assert!(emails[0].subject.contains("Registration Received"));
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = TestApp::spawn().await;
    app.register_request("dup@test.com").await;

    let resp = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&registration_body("dup@test.com"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn register_rejects_invalid_form() {
    let app = TestApp::spawn().await;
    let mut body = registration_body("bad@test.com");
    body["password"] = json!("short");

    let resp = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn login_before_approval_is_unauthorized() {
    let app = TestApp::spawn().await;
    app.register_request("waiting@test.com").await;

    let resp = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": "waiting@test.com", "password": TEST_PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = TestApp::spawn().await;
    app.approved_user("wrongpw@test.com").await;

    let resp = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": "wrongpw@test.com", "password": "not-the-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn me_returns_current_user() {
    let app = TestApp::spawn().await;
    let user = app.approved_user("me@test.com").await;

    let resp = app
        .auth_get("/api/auth/me", &user.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["email"], "me@test.com");
    assert_eq!(body["buddy_id"], user.buddy_id.as_str());
    assert_eq!(body["status"], "active");
}

#[tokio::test]
async fn me_without_token_is_unauthorized() {
    let app = TestApp::spawn().await;

    let resp = app.client.get(app.url("/api/auth/me")).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    let resp = app
        .auth_get("/api/auth/me", "not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn refresh_issues_new_tokens() {
    let app = TestApp::spawn().await;
    let user = app.approved_user("refresh@test.com").await;

    let resp = app
        .client
        .post(app.url("/api/auth/refresh"))
        .json(&json!({ "refresh_token": user.refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = resp.json().await.unwrap();
    let token = body["access_token"].as_str().unwrap();
    let resp = app.auth_get("/api/auth/me", token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn access_token_cannot_refresh() {
    let app = TestApp::spawn().await;
    let user = app.approved_user("wrongkind@test.com").await;

    let resp = app
        .client
        .post(app.url("/api/auth/refresh"))
        .json(&json!({ "refresh_token": user.access_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}

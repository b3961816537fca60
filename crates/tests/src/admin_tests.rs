use serde_json::{Value, json};

use crate::fixtures::test_app::TestApp;

#[tokio::test]
async fn ban_and_unban_round_trip() {
    let app = TestApp::spawn().await;
    let user = app.approved_user("ban@test.com").await;

    let resp = app
        .admin_post(&format!("/api/admin/user/{}/ban", user.id))
        .json(&json!({ "reason": "fraud" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "banned");
    assert_eq!(body["is_banned"], true);
    assert_eq!(body["ban_reason"], "fraud");

    // Banned users can still sign in
    app.login("ban@test.com").await;

    let resp = app
        .admin_post(&format!("/api/admin/user/{}/unban", user.id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "active");
    assert_eq!(body["is_banned"], false);
    assert!(body["ban_reason"].is_null());

    let emails = app.mailer.wait_for("ban@test.com", 4).await;
    assert!(emails.iter().any(|e| e.subject == "Account Suspension Notice" && e.body.contains("fraud")));
    assert!(emails.iter().any(|e| e.subject == "Account Restoration Notice"));
}

#[tokio::test]
async fn ban_requires_reason() {
    let app = TestApp::spawn().await;
    let user = app.approved_user("why@test.com").await;

    let resp = app
        .admin_post(&format!("/api/admin/user/{}/ban", user.id))
        .json(&json!({ "reason": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn ban_unknown_user_is_not_found() {
    let app = TestApp::spawn().await;

    let resp = app
        .admin_post("/api/admin/user/000000000000000000000000/ban")
        .json(&json!({ "reason": "ghost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn delete_user_removes_account_but_keeps_redemptions() {
    let app = TestApp::spawn().await;
    let user = app.approved_user("gone@test.com").await;
    let discount = app.create_discount("Keep", 3).await;
    let id = discount["id"].as_str().unwrap();
    app.auth_post(&format!("/api/discount/{id}/redeem"), &user.access_token)
        .send()
        .await
        .unwrap();

    let resp = app
        .admin_delete(&format!("/api/admin/user/{}", user.id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);

    let resp = app
        .auth_get("/api/auth/me", &user.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    let resp = app
        .admin_delete(&format!("/api/admin/user/{}", user.id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    let summary: Value = app
        .admin_get("/api/admin/dashboard")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary["summary"]["total_redemptions"], 1);
    assert_eq!(summary["summary"]["total_users"], 0);

    let emails = app.mailer.wait_for("gone@test.com", 3).await;
    assert!(emails.iter().any(|e| e.subject == "Account Deletion Confirmation"));
}

#[tokio::test]
async fn buddy_credit_is_bounded() {
    let app = TestApp::spawn().await;
    let user = app.approved_user("credit@test.com").await;
    let path = format!("/api/admin/user/{}/credit", user.id);

    let resp = app
        .admin_post(&path)
        .json(&json!({ "buddy_credit": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["buddy_credit"], 2);

    for bad in [-1, 6] {
        let resp = app
            .admin_post(&path)
            .json(&json!({ "buddy_credit": bad }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 422, "credit {bad}");
    }
}

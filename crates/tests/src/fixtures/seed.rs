use chrono::{Duration, Utc};
use serde_json::{Value, json};

use super::test_app::TestApp;

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";
pub const TEST_PASSWORD: &str = "Password123!";

/// An approved, logged-in user.
pub struct SeededUser {
    pub id: String,
    pub email: String,
    pub buddy_id: String,
    pub access_token: String,
    pub refresh_token: String,
}

impl TestApp {
    pub fn admin_get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .header(ADMIN_KEY_HEADER, &self.settings.admin.api_key)
    }

    pub fn admin_post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .header(ADMIN_KEY_HEADER, &self.settings.admin.api_key)
    }

    pub fn admin_put(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .put(self.url(path))
            .header(ADMIN_KEY_HEADER, &self.settings.admin.api_key)
    }

    pub fn admin_delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .delete(self.url(path))
            .header(ADMIN_KEY_HEADER, &self.settings.admin.api_key)
    }

    pub fn auth_get(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(token)
    }

    pub fn auth_post(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(token)
    }

    /// Submit a registration request and return its id.
    pub async fn register_request(&self, email: &str) -> String {
        let resp = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&registration_body(email))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 201, "registration failed");
        let body: Value = resp.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn login(&self, email: &str) -> Value {
        let resp = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": TEST_PASSWORD }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200, "login failed for {email}");
        resp.json().await.unwrap()
    }

    /// Register, approve and log in.
    pub async fn approved_user(&self, email: &str) -> SeededUser {
        let request_id = self.register_request(email).await;
        let resp = self
            .admin_post(&format!("/api/admin/request/{request_id}/approve"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 201, "approval failed");

        let auth = self.login(email).await;
        SeededUser {
            id: auth["user"]["id"].as_str().unwrap().to_string(),
            email: email.to_string(),
            buddy_id: auth["user"]["buddy_id"].as_str().unwrap().to_string(),
            access_token: auth["access_token"].as_str().unwrap().to_string(),
            refresh_token: auth["refresh_token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn create_coupon(&self, name: &str, codes: &[&str]) -> Value {
        let mut body = item_body(name, 20.0, 30);
        body["codes"] = json!(codes);
        self.create_item("/api/admin/coupon", body).await
    }

    pub async fn create_discount(&self, name: &str, total_count: i64) -> Value {
        let mut body = item_body(name, 15.0, 30);
        body["total_count"] = json!(total_count);
        self.create_item("/api/admin/discount", body).await
    }

    /// A coupon whose validity window closed yesterday.
    pub async fn create_expired_coupon(&self, name: &str, codes: &[&str]) -> Value {
        let mut body = item_body(name, 20.0, -1);
        body["start_date"] = json!(Utc::now() - Duration::days(10));
        body["codes"] = json!(codes);
        self.create_item("/api/admin/coupon", body).await
    }

    pub async fn create_item(&self, path: &str, body: Value) -> Value {
        let resp = self.admin_post(path).json(&body).send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 201, "creating item at {path} failed");
        resp.json().await.unwrap()
    }
}

pub fn registration_body(email: &str) -> Value {
    json!({
        "first_name": "Test",
        "last_name": "Buddy",
        "email": email,
        "password": TEST_PASSWORD,
        "phone_number": "555-0100",
        "service": "army",
        "category": "veteran",
        "document_name": "dd214.pdf",
        "document_url": "https://files.test/dd214.pdf",
    })
}

/// Item body valid from an hour ago until `days_left` days from now.
pub fn item_body(name: &str, discount: f64, days_left: i64) -> Value {
    let now = Utc::now();
    json!({
        "name": name,
        "description": format!("{name} deal"),
        "discount_percent": discount,
        "start_date": now - Duration::hours(1),
        "end_date": now + Duration::days(days_left),
        "category": ["food"],
        "company": "Acme",
        "product_tags": [name.to_lowercase()],
    })
}

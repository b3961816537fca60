use axum::{extract::FromRequestParts, http::request::Parts};

use super::auth::FromRef;
use crate::{error::ApiError, state::AppState};

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Marker for requests carrying the configured admin key.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser;

impl<S> FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let key = parts
            .headers
            .get(ADMIN_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Admin key required".to_string()))?;

        if !constant_time_eq(key.as_bytes(), app_state.settings.admin.api_key.as_bytes()) {
            return Err(ApiError::Forbidden("Invalid admin key".to_string()));
        }

        Ok(AdminUser)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

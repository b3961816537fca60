pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{delete, get, post, put},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.app.cors_origins);

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/refresh", post(routes::auth::refresh))
        .route("/me", get(routes::auth::me));

    let coupon_routes = Router::new()
        .route("/", get(routes::inventory::list_coupons))
        .route("/{coupon_id}/redeem", post(routes::inventory::redeem_coupon));

    let discount_routes = Router::new()
        .route("/", get(routes::inventory::list_discounts))
        .route(
            "/{discount_id}/redeem",
            post(routes::inventory::redeem_discount),
        );

    let redemption_routes = Router::new().route("/", get(routes::redemption::list_mine));

    // Everything below requires the admin key
    let admin_routes = Router::new()
        .route("/request", get(routes::admin::list_requests))
        .route("/request/{request_id}/approve", post(routes::admin::approve))
        .route("/request/{request_id}/reject", post(routes::admin::reject))
        .route("/user", get(routes::admin::list_users))
        .route("/user/{user_id}", delete(routes::admin::delete_user))
        .route("/user/{user_id}/ban", post(routes::admin::ban))
        .route("/user/{user_id}/unban", post(routes::admin::unban))
        .route("/user/{user_id}/credit", post(routes::admin::set_credit))
        .route(
            "/coupon",
            get(routes::inventory::list_all_coupons).post(routes::inventory::create_coupon),
        )
        .route(
            "/discount",
            get(routes::inventory::list_all_discounts).post(routes::inventory::create_discount),
        )
        .route("/inventory/reconcile", get(routes::inventory::reconcile))
        .route(
            "/inventory/{item_id}",
            put(routes::inventory::update).delete(routes::inventory::delete),
        )
        .route("/redemption/export", get(routes::export::redemptions))
        .route("/redemption/expire", post(routes::redemption::expire_due))
        .route("/redemption/{redemption_id}/use", post(routes::redemption::mark_used))
        .route("/dashboard", get(routes::dashboard::summary))
        .route(
            "/dashboard/redemption",
            get(routes::dashboard::redemption_analytics),
        )
        .route("/dashboard/user", get(routes::dashboard::user_analytics))
        .route("/dashboard/summary", get(routes::dashboard::summary_report));

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/coupon", coupon_routes)
        .nest("/discount", discount_routes)
        .route("/search", get(routes::search::search))
        .nest("/redemption", redemption_routes)
        .nest("/admin", admin_routes);

    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::HeaderName::from_static(extractors::admin::ADMIN_KEY_HEADER),
        ])
        .allow_credentials(true)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

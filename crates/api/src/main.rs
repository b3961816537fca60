use buddyperks_api::{build_router, state::AppState};
use buddyperks_config::Settings;
use buddyperks_db::{connect, indexes::ensure_indexes};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "buddyperks_api=debug,buddyperks_services=debug,buddyperks_db=debug,tower_http=debug"
                .into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;
    info!("Starting BuddyPerks API on {}:{}", settings.app.host, settings.app.port);
    info!(
        max_claim_attempts = settings.redemption.max_claim_attempts,
        mail_relay = ?settings.notifications.mail_relay_url,
        "Redemption/notification config"
    );

    let db = connect(&settings).await?;
    ensure_indexes(&db).await?;

    // Spawns the notification worker, so it must run inside the runtime
    let app_state = AppState::new(db, settings.clone());
    let app = build_router(app_state);

    let addr = format!("{}:{}", settings.app.host, settings.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

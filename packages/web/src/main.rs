use anyhow::Context as _;
use axum::Router;
use store::{MemoryStore, PgStore, Storage};
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::EnvFilter;

use web::{AppState, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::new().context("Failed to load settings")?;

    match settings.database.url.clone() {
        Some(url) => {
            let pool = api::db::connect(&url, settings.database.max_connections)
                .await
                .context("Failed to connect to database")?;
            api::db::run_migrations(&pool)
                .await
                .context("Failed to run migrations")?;

            let session_store = PostgresStore::new(pool.clone());
            session_store
                .migrate()
                .await
                .context("Failed to migrate session store")?;

            serve(settings, PgStore::new(pool), session_store).await
        }
        None => {
            tracing::warn!("no database configured, keeping documents in memory");
            serve(settings, MemoryStore::new(), tower_sessions::MemoryStore::default()).await
        }
    }
}

async fn serve<S, Sessions>(settings: Settings, store: S, sessions: Sessions) -> anyhow::Result<()>
where
    S: Storage,
    Sessions: SessionStore + Clone,
{
    let session_layer = SessionManagerLayer::new(sessions)
        .with_secure(settings.session.secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(
            settings.session.expiry_days,
        )));

    let addr = settings.server.address.clone();
    let router: Router = web::router(AppState::new(store, settings)).layer(session_layer);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router).await?;
    Ok(())
}

use anyhow::Context;
use tower_sessions::MemoryStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use marquee::{
    api::AppState,
    config::Config,
    create_router,
    db::{self, RedisSessionStore},
    web::templates,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marquee=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = db::create_pool(&config).await?;
    if config.run_migrations {
        db::run_migrations(&pool).await?;
    }

    let tera = templates::load().context("Failed to load templates")?;
    let state = AppState::new(pool, tera);
    let key = config.session_key()?;
    let ttl = config.session_ttl();

    let app = match config.redis_url.as_deref() {
        Some(url) => {
            let conn = db::redis::connect(url).await?;
            tracing::info!("Sessions stored in Redis");
            create_router(state, RedisSessionStore::new(conn), key, ttl)
        }
        None => {
            tracing::warn!("REDIS_URL not set, sessions are kept in memory");
            create_router(state, MemoryStore::default(), key, ttl)
        }
    };

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

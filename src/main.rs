use std::sync::Arc;

use lms_backend::cache::{CacheStore, MemoryCache, RedisCache};
use lms_backend::config::AppConfig;
use lms_backend::db::SqliteRepository;
use lms_backend::routes::router;
use lms_backend::state::AppState;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "lms_backend=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let cache: Arc<dyn CacheStore> = match &config.redis_url {
        Some(url) => {
            let redis = RedisCache::new(url)?;
            redis.connect().await?;
            info!("cache store connected to redis");
            Arc::new(redis)
        }
        None => {
            warn!("REDIS_URL not set, using the in-process cache");
            Arc::new(MemoryCache::new())
        }
    };

    let repo = Arc::new(SqliteRepository::new(pool));
    let state = AppState::from_config(&config, repo, cache.clone());

    let app = router(state);

    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    cache.disconnect().await?;
    Ok(())
}

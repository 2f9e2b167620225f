use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::services::CacheTtl;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    /// Unset means the process-local cache is used.
    pub redis_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub cache_ttl: CacheTtl,
    pub cancel_window_days: i64,
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Validation(format!("{} has an invalid value: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://lms.db?mode=rwc".to_string());
        let redis_url = env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty());
        let bind_addr = parse_var("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)))?;

        let defaults = CacheTtl::default();
        let view_secs = parse_var("CACHE_VIEW_TTL_SECS", defaults.view.as_secs())?;
        let listing_secs = parse_var("CACHE_LISTING_TTL_SECS", defaults.listing.as_secs())?;
        let cancel_window_days = parse_var("CANCEL_WINDOW_DAYS", 5_i64)?;

        Ok(Self {
            database_url,
            redis_url,
            bind_addr,
            cache_ttl: CacheTtl {
                view: Duration::from_secs(view_secs),
                listing: Duration::from_secs(listing_secs),
            },
            cancel_window_days,
        })
    }
}

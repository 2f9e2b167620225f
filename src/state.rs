use std::sync::Arc;

use chrono::Duration;

use crate::cache::CacheStore;
use crate::config::AppConfig;
use crate::db::EntityRepository;
use crate::services::{CacheTtl, CatalogService, EnrollmentService, QuizService};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn EntityRepository>,
    pub cache: Arc<dyn CacheStore>,
    pub catalog: Arc<CatalogService>,
    pub quizzes: Arc<QuizService>,
    pub enrollments: Arc<EnrollmentService>,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn EntityRepository>,
        cache: Arc<dyn CacheStore>,
        ttl: CacheTtl,
        cancel_window: Duration,
    ) -> Self {
        Self {
            catalog: Arc::new(CatalogService::new(repo.clone(), cache.clone(), ttl)),
            quizzes: Arc::new(QuizService::new(repo.clone(), cache.clone(), ttl)),
            enrollments: Arc::new(EnrollmentService::new(
                repo.clone(),
                cache.clone(),
                ttl,
                cancel_window,
            )),
            repo,
            cache,
        }
    }

    pub fn from_config(
        config: &AppConfig,
        repo: Arc<dyn EntityRepository>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self::new(
            repo,
            cache,
            config.cache_ttl,
            Duration::days(config.cancel_window_days),
        )
    }
}

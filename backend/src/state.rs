use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::oauth::TokenExchange;
use crate::services::{CourseGenerator, CourseService, ProgressEngine, TokenLifecycleManager};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    pub progress: ProgressEngine,
    pub tokens: TokenLifecycleManager,
    pub courses: CourseService,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        config: Config,
        exchange: Arc<dyn TokenExchange>,
        generator: Arc<dyn CourseGenerator>,
    ) -> Self {
        let tokens = TokenLifecycleManager::new(db.clone(), exchange);
        Self {
            progress: ProgressEngine::new(db.clone()),
            courses: CourseService::new(db.clone(), tokens.clone(), generator),
            tokens,
            config: Arc::new(config),
            db,
        }
    }
}

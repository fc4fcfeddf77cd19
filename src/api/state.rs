use std::sync::Arc;

use sqlx::PgPool;
use tera::Tera;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub templates: Arc<Tera>,
}

impl AppState {
    pub fn new(pool: PgPool, templates: Tera) -> Self {
        Self {
            pool,
            templates: Arc::new(templates),
        }
    }
}

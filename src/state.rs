// src/state.rs
use std::sync::Arc;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new(db_pool: PgPool, jwt_secret: &str) -> Self {
        AppState {
            db_pool,
            jwt_secret: Arc::from(jwt_secret),
        }
    }
}

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{AttemptStore, Clock, LoginThrottle};
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Failed-login counters. In-memory by default; swap the store to share it across replicas.
    pub throttle: Arc<LoginThrottle>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        config: Config,
        attempts: Arc<dyn AttemptStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let throttle = LoginThrottle::new(
            attempts,
            clock,
            config.login_max_attempts,
            config.login_lockout,
        );
        Self {
            db,
            config,
            throttle: Arc::new(throttle),
        }
    }
}

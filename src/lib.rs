pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod directory;
pub mod requests;

pub use db::DbPool;

use config::Config;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::SessionStore;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: Config, db: DbPool) -> Self {
        let sessions = Arc::new(SessionStore::new(Duration::from_secs(
            config.auth.session_timeout_secs,
        )));
        Self {
            config,
            db,
            sessions,
        }
    }
}

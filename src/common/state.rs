// Application state shared across all modules

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::common::config::AppConfig;
use crate::services::{CepService, GoogleService, StorageService};

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: AppConfig,
    pub storage: Arc<StorageService>,
    pub google_service: Arc<GoogleService>,
    pub cep_service: Arc<CepService>,
}

impl AppState {
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.config.is_admin_email(email)
    }
}

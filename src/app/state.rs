//! Application state management.

use std::sync::Arc;

use crate::domain::{DatabaseClient, Notifier};

use super::service::AppService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AppService>,
}

impl AppState {
    /// Create a new application state
    #[must_use]
    pub fn new(db_client: Arc<dyn DatabaseClient>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            service: Arc::new(AppService::new(db_client, notifier)),
        }
    }
}

pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::ml::ModelHandle;
use crate::models::ReportBook;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<ModelHandle>,
    pub reports: Arc<ReportBook>,
    /// finalRisk strictly above this raises the alert flag
    pub alert_threshold: u8,
}

impl AppState {
    pub fn new(model: Arc<ModelHandle>) -> Self {
        Self {
            model,
            reports: Arc::new(ReportBook::new()),
            alert_threshold: 70,
        }
    }

    pub fn with_alert_threshold(mut self, threshold: u8) -> Self {
        self.alert_threshold = threshold;
        self
    }
}

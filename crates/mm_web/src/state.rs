use std::sync::Arc;

use mm_core::ArticleStore;
use mm_report::ReportGenerator;

/// Shared handler state.
pub struct AppState {
    pub store: Arc<dyn ArticleStore>,
    pub reports: Arc<ReportGenerator>,
    /// Checked by the health probe when webhook delivery is configured.
    pub webhook_url: Option<String>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        reports: Arc<ReportGenerator>,
        webhook_url: Option<String>,
    ) -> Self {
        Self {
            store,
            reports,
            webhook_url,
        }
    }
}

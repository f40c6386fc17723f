use std::sync::Arc;

use tracing::{info, warn};

use mm_core::{AppConfig, Result, Summarizer};

pub mod gemini;
pub mod local;
pub mod prompts;

pub use gemini::GeminiSummarizer;
pub use local::LocalSummarizer;

pub mod prelude {
    pub use super::{create_summarizer, GeminiSummarizer, LocalSummarizer};
    pub use mm_core::{Summarizer, SummaryMode};
}

/// Pick the summarizer for this deployment. Falls back to the offline model
/// when no API key is configured, so a bare checkout still produces reports.
pub fn create_summarizer(config: &AppConfig) -> Result<Arc<dyn Summarizer>> {
    if config.local_mode {
        info!("LOCAL_MODE set, using the local summarizer");
        return Ok(Arc::new(LocalSummarizer::new()));
    }

    match &config.gemini_api_key {
        Some(key) => {
            info!(model = %config.gemini_model, "using the Gemini summarizer");
            Ok(Arc::new(GeminiSummarizer::new(
                key.clone(),
                config.gemini_model.clone(),
                config.worker_cap,
            )?))
        }
        None => {
            warn!("no GEMINI_API_KEY, falling back to the local summarizer");
            Ok(Arc::new(LocalSummarizer::new()))
        }
    }
}

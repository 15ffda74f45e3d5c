use crate::ai::ActionExtractor;
use crate::core::AppConfig;

/// Read-only state shared by every request. Extraction is stateless
/// so nothing here needs a lock.
pub struct AppState {
    pub config: AppConfig,
    pub extractor: ActionExtractor,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let extractor = ActionExtractor::from_config(&config);
        Self { config, extractor }
    }

    pub fn with_extractor(config: AppConfig, extractor: ActionExtractor) -> Self {
        Self { config, extractor }
    }
}

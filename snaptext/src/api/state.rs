use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::ocr::ExtractorFactory;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Shared so the local daemon's pull/warm-up runs once per process.
    pub extractors: ExtractorFactory,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let extractors = ExtractorFactory::new(&config.ocr)?;
        Ok(Self {
            config: Arc::new(config),
            extractors,
        })
    }
}

//! Application state management

use narrate_core::{AudiobookPipeline, NarrateConfig, Synthesizer, Voice};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<NarrateConfig>,
    pub default_voice: Voice,
    pub pipeline: Arc<AudiobookPipeline<dyn Synthesizer>>,
}

impl AppState {
    pub fn new(config: NarrateConfig, synthesizer: Arc<dyn Synthesizer>) -> narrate_core::Result<Self> {
        let pipeline = AudiobookPipeline::new(&config, synthesizer)?;
        Ok(Self {
            default_voice: config.fallback_voice()?,
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        })
    }
}

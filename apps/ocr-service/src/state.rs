//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::DocumentPipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    pipeline: DocumentPipeline,
}

impl AppState {
    pub fn new(config: Config, pipeline: DocumentPipeline) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, pipeline }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the document pipeline
    pub fn pipeline(&self) -> &DocumentPipeline {
        &self.inner.pipeline
    }
}

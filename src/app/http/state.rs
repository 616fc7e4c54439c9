//! Application state for the HTTP server.

use crate::core::engine::AnalysisEngine;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: AnalysisEngine,
    /// Reported by `/health`
    pub service_name: String,
}

impl AppState {
    pub fn new(engine: AnalysisEngine, service_name: impl Into<String>) -> Self {
        Self {
            engine,
            service_name: service_name.into(),
        }
    }
}

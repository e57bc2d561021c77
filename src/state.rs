//! Application state
//!
//! One instance per program run. Owns the session-wide credential and
//! log, and wires the analyzer and capture controller. Components get
//! what they need as `Arc`s; there are no hidden singletons.

use crate::capture_controller::CaptureController;
use crate::config::AppConfig;
use crate::credential::CredentialHolder;
use crate::log_store::LogStore;
use crate::vision_client::{GeminiClient, ImageAnalyzer};
use std::sync::Arc;

/// Session state shared across screens
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Session credential holder
    pub credential: Arc<CredentialHolder>,
    /// In-memory analysis log
    pub log: Arc<LogStore>,
    /// Capture controller (camera lifecycle + round trip)
    pub controller: Arc<CaptureController>,
}

impl AppState {
    /// Wire up a fresh session against the Gemini client
    pub fn new(config: AppConfig) -> Self {
        let analyzer: Arc<dyn ImageAnalyzer> = Arc::new(GeminiClient::new(
            config.gemini_base_url.clone(),
            config.gemini_model.clone(),
        ));
        Self::with_analyzer(config, analyzer)
    }

    /// Wire up a session with a caller-supplied analyzer
    pub fn with_analyzer(config: AppConfig, analyzer: Arc<dyn ImageAnalyzer>) -> Self {
        let credential = Arc::new(CredentialHolder::new());
        let log = Arc::new(LogStore::new());
        let controller = Arc::new(CaptureController::new(
            analyzer,
            credential.clone(),
            log.clone(),
            config.jpeg_quality,
        ));

        Self {
            config,
            credential,
            log,
            controller,
        }
    }
}

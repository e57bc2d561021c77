//! Application configuration
//!
//! Defaults with environment overrides. The credential is never part of the
//! config; it is entered interactively and held in memory only.

use crate::camera::Facing;
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Gemini API base URL
    pub gemini_base_url: String,
    /// Gemini model identifier
    pub gemini_model: String,
    /// Directory export artifacts are written to
    pub export_dir: PathBuf,
    /// JPEG quality for captured frames (0-100)
    pub jpeg_quality: u8,
    /// Camera facing preference
    pub facing: Facing,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gemini_base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".to_string()),
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash-image".to_string()),
            export_dir: std::env::var("EXPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            jpeg_quality: 80,
            facing: Facing::Environment,
        }
    }
}

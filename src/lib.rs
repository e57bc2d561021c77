//! Vision Logger Library
//!
//! Session-scoped capture-analyze-log pipeline.
//!
//! ## Architecture (7 Components)
//!
//! 1. CredentialHolder - session-only API credential
//! 2. Camera boundary - acquire/sample/stop contract + JPEG encoding
//! 3. Vision Analysis Client - Gemini generateContent adapter
//! 4. CaptureController - camera lifecycle and capture round trip
//! 5. LogStore - in-memory analysis log, newest first
//! 6. Export - JSON/CSV artifacts
//! 7. View routing - credential-gated screen selection
//!
//! ## Design Principles
//!
//! - Everything is volatile: no storage survives the session
//! - One capture in flight at a time, enforced by controller state
//! - Failures never kill the session; the controller always returns
//!   to a usable state

pub mod camera;
pub mod capture_controller;
pub mod config;
pub mod credential;
pub mod error;
pub mod export;
pub mod log_store;
pub mod state;
pub mod view;
pub mod vision_client;

pub use error::{Error, Result};
pub use state::AppState;

//! Error handling for the vision logger

use std::borrow::Cow;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Camera denied or unavailable
    #[error("{0}")]
    Permission(String),

    /// Vision analysis failure, already normalized to its user-facing message
    #[error("{0}")]
    Analysis(String),

    /// Config error
    #[error("Config error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame encoding error
    #[error("Image encode error: {0}")]
    Image(#[from] image::ImageError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Message suitable for direct display at the view boundary.
    ///
    /// `Permission` and `Analysis` carry their user-facing text verbatim.
    /// Everything else is plumbing that should not normally reach a screen,
    /// so it is wrapped generically.
    pub fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Permission(msg) | Error::Analysis(msg) => Cow::Borrowed(msg),
            other => Cow::Owned(format!("Unexpected error: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_passthrough() {
        let err = Error::Permission("Unable to access camera. Please allow permissions.".into());
        assert_eq!(
            err.user_message(),
            "Unable to access camera. Please allow permissions."
        );
    }

    #[test]
    fn test_user_message_wraps_plumbing() {
        let err = Error::Internal("boom".into());
        assert!(err.user_message().starts_with("Unexpected error:"));
    }
}

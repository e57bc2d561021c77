//! Session credential handling
//!
//! ## Responsibilities
//!
//! - Hold the opaque API credential for the current session only
//! - Clear the entry buffer the moment a credential is accepted
//! - Keep the token out of Debug output and logs

use crate::error::{Error, Result};
use std::fmt;
use tokio::sync::RwLock;

/// Opaque bearer token authorizing vision analysis calls.
///
/// Non-empty by construction. Lives only in volatile memory.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Build from raw input. Leading/trailing whitespace is trimmed;
    /// an effectively empty input is rejected.
    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::Config("Credential must not be empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Access the underlying token for request construction.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Session-scoped holder for the credential.
///
/// Owned by the application state and handed by `Arc` to whichever
/// component issues analysis calls.
#[derive(Default)]
pub struct CredentialHolder {
    inner: RwLock<Option<Credential>>,
}

impl CredentialHolder {
    /// Create an empty holder
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept a credential from an entry buffer.
    ///
    /// The buffer is cleared before this returns, whether or not the
    /// input was valid, so the token is not retrievable from the entry
    /// widget afterwards.
    pub async fn accept(&self, input: &mut String) -> Result<()> {
        let parsed = Credential::new(input);
        input.clear();
        let credential = parsed?;

        let mut slot = self.inner.write().await;
        *slot = Some(credential);
        tracing::info!("Session credential accepted");
        Ok(())
    }

    /// Current credential, if one has been accepted this session
    pub async fn get(&self) -> Option<Credential> {
        self.inner.read().await.clone()
    }

    /// Whether a credential is held
    pub async fn is_set(&self) -> bool {
        self.inner.read().await.is_some()
    }
}

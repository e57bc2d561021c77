//! View routing
//!
//! Selects which top-level screen is visible. Pure selection logic; the
//! rendering itself lives with the presentation shell.

/// Top-level screens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppView {
    /// Credential entry; forced while no credential is held
    ApiSetup,
    /// Live capture screen
    Camera,
    /// Session log screen
    History,
}

/// Route a view request, gating on credential presence.
///
/// Without a credential every request lands on `ApiSetup`.
pub fn route(credential_set: bool, requested: AppView) -> AppView {
    if !credential_set {
        return AppView::ApiSetup;
    }
    requested
}

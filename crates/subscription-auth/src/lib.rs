//! OAuth PKCE login and token lifecycle for a subscription account
//!
//! Obtains a short-lived bearer token for the local process: an interactive
//! browser consent the first time, silent refresh afterwards, with the
//! credential persisted to disk between runs.
//!
//! Credential flow:
//! 1. `CredentialManager::access_token()` loads the stored credential
//! 2. Fresh (more than 60s left) → returned as-is
//! 3. Expiring → `TokenExchanger::refresh()`, new credential saved
//! 4. Absent or refresh failed → `None`
//! 5. `CredentialManager::authenticate()` runs PKCE consent, reads the
//!    pasted `code#state`, redeems it and saves the result

pub mod browser;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod flow;
pub mod manager;
pub mod pkce;
pub mod settings;
pub mod token;

pub use browser::{NoopOpener, SystemOpener, UrlOpener};
pub use constants::*;
pub use credentials::{Credential, CredentialStore};
pub use error::{Error, Result};
pub use flow::FlowHooks;
pub use manager::{CredentialManager, TokenState};
pub use pkce::{PkcePair, build_authorization_url, compute_challenge};
pub use settings::AuthSettings;
pub use token::{TokenExchanger, TokenResponse};

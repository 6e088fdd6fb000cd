//! Runtime settings for a credential manager

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{AUTHORIZE_ENDPOINT, DEFAULT_HTTP_TIMEOUT, TOKEN_ENDPOINT};
use crate::credentials::CredentialStore;
use crate::error::Result;

/// Where credentials live and which endpoints to talk to.
///
/// Endpoints default to the provider's; tests point them at a mock server.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub store_path: PathBuf,
    pub authorize_url: String,
    pub token_url: String,
    pub timeout: Duration,
}

impl AuthSettings {
    /// Provider endpoints with the credential file at `store_path`.
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            authorize_url: AUTHORIZE_ENDPOINT.to_string(),
            token_url: TOKEN_ENDPOINT.to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Provider endpoints with the credential file under `$HOME`.
    pub fn from_home() -> Result<Self> {
        Ok(Self::new(CredentialStore::default_path()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_provider_endpoints() {
        let settings = AuthSettings::new("/tmp/oauth.json");
        assert_eq!(settings.token_url, TOKEN_ENDPOINT);
        assert_eq!(settings.authorize_url, AUTHORIZE_ENDPOINT);
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.store_path, PathBuf::from("/tmp/oauth.json"));
    }
}

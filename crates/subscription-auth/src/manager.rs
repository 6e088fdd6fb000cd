//! Credential manager: the token accessor and the interactive login
//!
//! Per call of [`CredentialManager::access_token`]:
//!
//! - `NoCredential`: nothing usable on disk → `None`
//! - `Fresh`: expires more than 60s from now → cached token, no network
//! - `Expiring`: refresh once; on success persist and return the new token
//! - `RefreshFailed`: → `None`, the stale credential stays on disk
//!
//! The accessor never returns an error. [`CredentialManager::authenticate`]
//! does, because a human is waiting on it.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::browser::{SystemOpener, UrlOpener};
use crate::constants::AUTHORIZE_ENDPOINT;
use crate::credentials::{Credential, CredentialStore};
use crate::error::{Error, Result};
use crate::flow::FlowHooks;
use crate::pkce::{PkcePair, build_authorization_url};
use crate::settings::AuthSettings;
use crate::token::TokenExchanger;

/// Outcome of inspecting the stored credential for one accessor call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    NoCredential,
    Fresh,
    Expiring,
    RefreshFailed,
}

impl TokenState {
    pub fn label(&self) -> &'static str {
        match self {
            TokenState::NoCredential => "no_credential",
            TokenState::Fresh => "fresh",
            TokenState::Expiring => "expiring",
            TokenState::RefreshFailed => "refresh_failed",
        }
    }
}

/// Obtains and maintains the access token for this process.
pub struct CredentialManager {
    store: CredentialStore,
    exchanger: TokenExchanger,
    authorize_url: String,
    opener: Arc<dyn UrlOpener>,
}

impl CredentialManager {
    /// Manager using the provider's consent page and the system browser.
    pub fn new(store: CredentialStore, exchanger: TokenExchanger) -> Self {
        Self {
            store,
            exchanger,
            authorize_url: AUTHORIZE_ENDPOINT.to_string(),
            opener: Arc::new(SystemOpener),
        }
    }

    pub fn from_settings(settings: &AuthSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| Error::Http(format!("building HTTP client: {e}")))?;

        Ok(Self::new(
            CredentialStore::new(&settings.store_path),
            TokenExchanger::new(http, &settings.token_url),
        )
        .with_authorize_url(&settings.authorize_url))
    }

    pub fn with_opener(mut self, opener: impl UrlOpener + 'static) -> Self {
        self.opener = Arc::new(opener);
        self
    }

    pub fn with_authorize_url(mut self, url: impl Into<String>) -> Self {
        self.authorize_url = url.into();
        self
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Current valid access token, refreshing silently if needed.
    pub async fn access_token(&self) -> Option<String> {
        let Some(credential) = self.store.load().await else {
            record_state(TokenState::NoCredential);
            return None;
        };

        if credential.is_fresh() {
            record_state(TokenState::Fresh);
            return Some(credential.access_token);
        }

        debug!(
            expires_at = credential.expires_at,
            "access token expiring, attempting refresh"
        );

        match self.refresh(&credential).await {
            Ok(refreshed) => {
                record_state(TokenState::Expiring);
                metrics::counter!("auth_refresh_total", "outcome" => "success").increment(1);
                info!(expires_at = refreshed.expires_at, "access token refreshed");
                Some(refreshed.access_token)
            }
            Err(e) => {
                metrics::counter!("auth_refresh_total", "outcome" => "failure").increment(1);
                record_state(TokenState::RefreshFailed);
                warn!(error = %e, "token refresh failed, treating as unauthenticated");
                None
            }
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.access_token().await.is_some()
    }

    /// Run the browser consent flow unless a usable token already exists.
    ///
    /// Waits on the code prompt indefinitely.
    pub async fn authenticate(&self, hooks: &FlowHooks) -> Result<String> {
        if let Some(token) = self.access_token().await {
            debug!("already authenticated, skipping interactive flow");
            return Ok(token);
        }

        let pair = PkcePair::generate();
        let url = build_authorization_url(&self.authorize_url, &pair);

        if let Err(e) = self.opener.open(&url).await {
            warn!(error = %e, "could not open browser, user must navigate manually");
        }
        hooks.url_ready(&url);

        match self.redeem(hooks, &pair).await {
            Ok(credential) => {
                metrics::counter!("auth_login_total", "outcome" => "success").increment(1);
                info!(path = %self.store.path().display(), "interactive login succeeded");
                hooks.succeeded();
                Ok(credential.access_token)
            }
            Err(e) => {
                metrics::counter!("auth_login_total", "outcome" => "failure").increment(1);
                warn!(error = %e, "interactive login failed");
                hooks.failed(&e);
                Err(e)
            }
        }
    }

    /// Remove stored credentials (local logout).
    pub async fn clear_credentials(&self) -> Result<()> {
        self.store.clear().await?;
        info!(path = %self.store.path().display(), "credentials cleared");
        Ok(())
    }

    async fn refresh(&self, credential: &Credential) -> Result<Credential> {
        let refreshed = self.exchanger.refresh(&credential.refresh_token).await?;
        if let Err(e) = self.store.save(&refreshed).await {
            // The token is still good for this process; the next load refreshes again.
            warn!(error = %e, "failed to persist refreshed credential");
        }
        Ok(refreshed)
    }

    async fn redeem(&self, hooks: &FlowHooks, pair: &PkcePair) -> Result<Credential> {
        let code = hooks.read_code().await?;
        let credential = self.exchanger.exchange_code(&code, pair.verifier()).await?;
        self.store.save(&credential).await?;
        Ok(credential)
    }
}

fn record_state(state: TokenState) {
    metrics::counter!("auth_token_requests_total", "state" => state.label()).increment(1);
}

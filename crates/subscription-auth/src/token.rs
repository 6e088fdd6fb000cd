//! Token endpoint exchanges
//!
//! Two grant shapes against one endpoint, both as JSON bodies:
//! 1. `authorization_code` to finish the interactive flow
//! 2. `refresh_token` to mint a new access token silently
//!
//! Each call is a single attempt. Callers decide what a failure means.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{CLIENT_ID, REDIRECT_URI};
use crate::credentials::{Credential, now_millis};
use crate::error::{Error, Result};

/// Response body shared by both grants.
///
/// `expires_in` is relative (seconds). It becomes an absolute `expires_at`
/// at the moment the response is received, so client clock skew shifts the
/// refresh point by the same amount.
#[derive(Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: u64,
}

impl TokenResponse {
    /// Build a credential received at `received_at` (unix ms).
    ///
    /// A rotated refresh token always wins; `previous_refresh` is used only
    /// when the response omits one.
    pub fn into_credential(
        self,
        previous_refresh: Option<&str>,
        received_at: u64,
    ) -> Result<Credential> {
        let refresh_token = self
            .refresh_token
            .filter(|token| !token.is_empty())
            .or_else(|| previous_refresh.map(str::to_owned))
            .ok_or_else(|| Error::TokenExchange("token response missing refresh_token".into()))?;

        if self.access_token.is_empty() {
            return Err(Error::TokenExchange(
                "token response has empty access_token".into(),
            ));
        }

        Ok(Credential {
            access_token: self.access_token,
            refresh_token,
            expires_at: received_at.saturating_add(self.expires_in.saturating_mul(1000)),
        })
    }
}

#[derive(Serialize)]
struct AuthorizationCodeGrant<'a> {
    code: &'a str,
    state: &'a str,
    grant_type: &'static str,
    client_id: &'static str,
    redirect_uri: &'static str,
    code_verifier: &'a str,
}

#[derive(Serialize)]
struct RefreshTokenGrant<'a> {
    grant_type: &'static str,
    refresh_token: &'a str,
    client_id: &'static str,
}

/// Split the pasted `code#state` value.
///
/// Without a `#` the whole input is the code and the state falls back to
/// `verifier`, which is what we sent as `state` in the first place.
pub fn split_code<'a>(input: &'a str, verifier: &'a str) -> (&'a str, &'a str) {
    let input = input.trim();
    match input.split_once('#') {
        Some((code, state)) => (code, state),
        None => (input, verifier),
    }
}

/// Client for the token endpoint.
#[derive(Debug, Clone)]
pub struct TokenExchanger {
    http: reqwest::Client,
    token_url: String,
}

impl TokenExchanger {
    pub fn new(http: reqwest::Client, token_url: impl Into<String>) -> Self {
        Self {
            http,
            token_url: token_url.into(),
        }
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Redeem an authorization code (`code#state`) with the PKCE verifier.
    pub async fn exchange_code(&self, code: &str, verifier: &str) -> Result<Credential> {
        let (code, state) = split_code(code, verifier);
        if code.is_empty() {
            return Err(Error::TokenExchange("authorization code is empty".into()));
        }

        let grant = AuthorizationCodeGrant {
            code,
            state,
            grant_type: "authorization_code",
            client_id: CLIENT_ID,
            redirect_uri: REDIRECT_URI,
            code_verifier: verifier,
        };

        let response = self
            .http
            .post(&self.token_url)
            .json(&grant)
            .send()
            .await
            .map_err(|e| Error::Http(format!("token exchange request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            return Err(Error::TokenExchange(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| Error::TokenExchange(format!("invalid token response: {e}")))?;

        debug!(expires_in = token.expires_in, "authorization code redeemed");
        token.into_credential(None, now_millis())
    }

    /// Mint a new credential from a refresh token.
    ///
    /// 401/403 means the refresh token is revoked or invalid and maps to
    /// `Error::InvalidCredentials`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Credential> {
        let grant = RefreshTokenGrant {
            grant_type: "refresh_token",
            refresh_token,
            client_id: CLIENT_ID,
        };

        let response = self
            .http
            .post(&self.token_url)
            .json(&grant)
            .send()
            .await
            .map_err(|e| Error::Http(format!("token refresh request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(Error::InvalidCredentials(format!(
                    "refresh token rejected ({status}): {body}"
                )));
            }

            return Err(Error::TokenExchange(format!(
                "token refresh returned {status}: {body}"
            )));
        }

        let token = response
            .json::<TokenResponse>()
            .await
            .map_err(|e| Error::TokenExchange(format!("invalid refresh response: {e}")))?;

        debug!(
            expires_in = token.expires_in,
            rotated = token.refresh_token.is_some(),
            "access token refreshed"
        );
        token.into_credential(Some(refresh_token), now_millis())
    }
}

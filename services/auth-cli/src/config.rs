//! Configuration types and loading
//!
//! Precedence: CLI args > env vars > config file > defaults. Every key is
//! optional, so running without a config file uses the provider endpoints
//! and `$HOME/.subscription-auth/oauth.json`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use subscription_auth::{AUTHORIZE_ENDPOINT, AuthSettings, CredentialStore, TOKEN_ENDPOINT};

/// Config file used when neither `--config` nor `CONFIG_PATH` is given
pub const DEFAULT_CONFIG_PATH: &str = "subscription-auth.toml";

/// Env var overriding `[store] path`
pub const STORE_ENV: &str = "SUBSCRIPTION_AUTH_STORE";

/// Root configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub oauth: OAuthConfig,
}

/// Credential file location
#[derive(Debug, Default, Deserialize)]
pub struct StoreConfig {
    /// Defaults to `$HOME/.subscription-auth/oauth.json`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Provider endpoints and HTTP behaviour
#[derive(Debug, Deserialize)]
pub struct OAuthConfig {
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_authorize_url() -> String {
    AUTHORIZE_ENDPOINT.to_string()
}

fn default_token_url() -> String {
    TOKEN_ENDPOINT.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Load a TOML file, overlay environment variables, then validate.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.finish()
    }

    /// Like [`Config::load`], but a missing default config file yields defaults.
    ///
    /// A path the user named explicitly must exist.
    pub fn load_or_default(path: &Path) -> common::Result<Self> {
        if path == Path::new(DEFAULT_CONFIG_PATH) && !path.exists() {
            return Config::default().finish();
        }
        Self::load(path)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from(DEFAULT_CONFIG_PATH)
    }

    /// Library settings, resolving the default store path if none is set.
    pub fn into_settings(self) -> common::Result<AuthSettings> {
        let store_path = match self.store.path {
            Some(path) => path,
            None => CredentialStore::default_path()
                .map_err(|e| common::Error::Config(format!("store path: {e}")))?,
        };

        let mut settings = AuthSettings::new(store_path);
        settings.authorize_url = self.oauth.authorize_url;
        settings.token_url = self.oauth.token_url;
        settings.timeout = Duration::from_secs(self.oauth.timeout_secs);
        Ok(settings)
    }

    fn finish(mut self) -> common::Result<Self> {
        if let Ok(path) = std::env::var(STORE_ENV) {
            let path = path.trim();
            if !path.is_empty() {
                self.store.path = Some(PathBuf::from(path));
            }
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> common::Result<()> {
        for (key, url) in [
            ("authorize_url", &self.oauth.authorize_url),
            ("token_url", &self.oauth.token_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(common::Error::Config(format!(
                    "{key} must start with http:// or https://, got: {url}"
                )));
            }
        }

        if self.oauth.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

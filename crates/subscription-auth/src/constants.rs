//! Fixed OAuth client parameters
//!
//! These identify the public client application and are not secrets. The
//! secrets (access/refresh tokens) live in the credential store.

use std::time::Duration;

/// Public OAuth client ID
pub const CLIENT_ID: &str = "9d1c250a-e61b-44d9-88ed-5944d1962f5e";

/// Hosted callback page that displays the `code#state` value for pasting
pub const REDIRECT_URI: &str = "https://console.anthropic.com/oauth/code/callback";

/// Token endpoint for code exchange and token refresh
pub const TOKEN_ENDPOINT: &str = "https://console.anthropic.com/v1/oauth/token";

/// Browser consent page for subscription accounts
pub const AUTHORIZE_ENDPOINT: &str = "https://claude.ai/oauth/authorize";

/// Space-separated scopes requested during consent
pub const SCOPES: &str = "org:create_api_key user:profile user:inference";

/// PKCE challenge method tag
pub const CHALLENGE_METHOD: &str = "S256";

/// A cached access token is used only if it outlives now by more than this.
pub const EXPIRY_MARGIN_MILLIS: u64 = 60_000;

/// Directory under `$HOME` holding the credential file
pub const CREDENTIAL_DIR: &str = ".subscription-auth";

/// Credential file name inside `CREDENTIAL_DIR`
pub const CREDENTIAL_FILE: &str = "oauth.json";

/// Default request timeout against the token endpoint
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

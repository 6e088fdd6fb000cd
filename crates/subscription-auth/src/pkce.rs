//! PKCE pair generation and consent URL construction (RFC 7636)
//!
//! A fresh verifier is minted for every interactive attempt and never
//! persisted. Because no local redirect listener exists, the verifier also
//! travels through the provider as the opaque `state` parameter and comes
//! back to us inside the pasted `code#state` value.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use common::Secret;
use rand::RngExt;
use sha2::{Digest, Sha256};

use crate::constants::{CHALLENGE_METHOD, CLIENT_ID, REDIRECT_URI, SCOPES};

/// Random bytes behind each verifier (512 bits of entropy).
const VERIFIER_BYTES: usize = 64;

/// One verifier/challenge pair for a single authentication attempt.
#[derive(Debug, Clone)]
pub struct PkcePair {
    verifier: Secret<String>,
    challenge: String,
}

impl PkcePair {
    /// Generate a new pair from the thread-local CSPRNG.
    ///
    /// The verifier is 86 characters of unpadded base64url, inside the
    /// 43-128 range RFC 7636 allows.
    pub fn generate() -> Self {
        let mut bytes = [0u8; VERIFIER_BYTES];
        rand::rng().fill(&mut bytes);
        let verifier = URL_SAFE_NO_PAD.encode(bytes);
        let challenge = compute_challenge(&verifier);
        Self {
            verifier: Secret::new(verifier),
            challenge,
        }
    }

    pub fn verifier(&self) -> &str {
        self.verifier.expose_str()
    }

    pub fn challenge(&self) -> &str {
        &self.challenge
    }
}

/// `BASE64URL(SHA256(verifier))`, the S256 transform.
pub fn compute_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Build the consent URL for `pair` against `authorize_endpoint`.
///
/// The verifier doubles as `state`; the provider echoes it back after the
/// `#` in the code shown on the callback page.
pub fn build_authorization_url(authorize_endpoint: &str, pair: &PkcePair) -> String {
    format!(
        "{}?code=true&client_id={}&response_type=code&redirect_uri={}&scope={}&code_challenge={}&code_challenge_method={}&state={}",
        authorize_endpoint,
        CLIENT_ID,
        percent_encode(REDIRECT_URI),
        percent_encode(SCOPES),
        pair.challenge(),
        CHALLENGE_METHOD,
        pair.verifier(),
    )
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 3);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::AUTHORIZE_ENDPOINT;

    fn is_base64url(s: &str) -> bool {
        s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    #[test]
    fn verifier_is_unpadded_base64url() {
        let pair = PkcePair::generate();
        assert_eq!(pair.verifier().len(), 86);
        assert!(is_base64url(pair.verifier()), "got: {}", pair.verifier());
    }

    #[test]
    fn successive_verifiers_differ() {
        let a = PkcePair::generate();
        let b = PkcePair::generate();
        assert_ne!(a.verifier(), b.verifier());
        assert_ne!(a.challenge(), b.challenge());
    }

    #[test]
    fn challenge_is_transform_of_verifier() {
        for _ in 0..8 {
            let pair = PkcePair::generate();
            assert_eq!(pair.challenge(), compute_challenge(pair.verifier()));
        }
    }

    #[test]
    fn challenge_matches_known_value() {
        // SHA256("hello") = 2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824
        assert_eq!(
            compute_challenge("hello"),
            "LPJNul-wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ"
        );
    }

    #[test]
    fn challenge_decodes_to_sha256_length() {
        let pair = PkcePair::generate();
        assert_eq!(pair.challenge().len(), 43);
        let decoded = URL_SAFE_NO_PAD.decode(pair.challenge()).unwrap();
        assert_eq!(decoded.len(), 32);
    }

    #[test]
    fn debug_does_not_leak_verifier() {
        let pair = PkcePair::generate();
        let debug = format!("{pair:?}");
        assert!(!debug.contains(pair.verifier()), "got: {debug}");
    }

    #[test]
    fn authorization_url_carries_all_parameters() {
        let pair = PkcePair::generate();
        let url = build_authorization_url(AUTHORIZE_ENDPOINT, &pair);

        assert!(url.starts_with("https://claude.ai/oauth/authorize?code=true&"));
        assert!(url.contains(&format!("client_id={CLIENT_ID}")));
        assert!(url.contains("response_type=code"));
        assert!(url.contains(
            "redirect_uri=https%3A%2F%2Fconsole.anthropic.com%2Foauth%2Fcode%2Fcallback"
        ));
        assert!(url.contains("scope=org%3Acreate_api_key%20user%3Aprofile%20user%3Ainference"));
        assert!(url.contains(&format!("code_challenge={}", pair.challenge())));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.ends_with(&format!("state={}", pair.verifier())));
    }

    #[test]
    fn percent_encode_leaves_unreserved_alone() {
        assert_eq!(percent_encode("abc-_.~XYZ09"), "abc-_.~XYZ09");
        assert_eq!(percent_encode("a b:c/d"), "a%20b%3Ac%2Fd");
    }
}

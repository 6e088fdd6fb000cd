//! Redacting wrapper for values that must never reach a log line

use std::fmt;
use zeroize::Zeroize;

/// Sensitive value. Formats as `[REDACTED]` and is wiped from memory on drop.
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the inner value. Callers must not log it.
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl Secret<String> {
    /// Borrow the inner string as `&str`.
    pub fn expose_str(&self) -> &str {
        self.0.as_str()
    }
}

impl<T: Zeroize> From<T> for Secret<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T: Zeroize> Drop for Secret<T> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_and_display_are_redacted() {
        let verifier = Secret::new(String::from("pkce-verifier-value"));
        assert_eq!(format!("{verifier:?}"), "[REDACTED]");
        assert_eq!(format!("{verifier}"), "[REDACTED]");
    }

    #[test]
    fn redaction_holds_inside_derived_debug() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Attempt {
            verifier: Secret<String>,
        }

        let attempt = Attempt {
            verifier: "leaky".to_string().into(),
        };
        let debug = format!("{attempt:?}");
        assert!(!debug.contains("leaky"), "got: {debug}");
    }

    #[test]
    fn expose_str_returns_inner_value() {
        let secret = Secret::from(String::from("rt_abc"));
        assert_eq!(secret.expose_str(), "rt_abc");
        assert_eq!(secret.clone().expose(), "rt_abc");
    }
}

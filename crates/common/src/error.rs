//! Configuration and I/O errors shared by binaries

use thiserror::Error;

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias using common Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_the_problem() {
        let err = Error::Config("token_url must start with http:// or https://".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: token_url must start with http:// or https://"
        );
    }

    #[test]
    fn io_error_converts_with_question_mark() {
        fn read_missing() -> Result<String> {
            Ok(std::fs::read_to_string("/nonexistent/subscription-auth.toml")?)
        }

        let err = read_missing().unwrap_err();
        assert!(matches!(err, Error::Io(_)), "got: {err:?}");
        assert!(err.to_string().starts_with("I/O error:"));
    }

    #[test]
    fn toml_error_converts_with_question_mark() {
        fn parse_bad() -> Result<toml::Table> {
            Ok(toml::from_str("[store\npath = ")?)
        }

        let err = parse_bad().unwrap_err();
        assert!(matches!(err, Error::Toml(_)), "got: {err:?}");
    }
}

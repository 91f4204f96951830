//! Common error types

use thiserror::Error;

/// Errors from configuration loading and local persistence.
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
    fn config_error_carries_the_rejected_field() {
        let err = Error::Config("base_url must not be empty".into());
        assert_eq!(
            err.to_string(),
            "Configuration error: base_url must not be empty"
        );
    }

    #[test]
    fn io_errors_convert_for_question_mark() {
        fn read_missing() -> Result<String> {
            Ok(std::fs::read_to_string("/nonexistent/session.toml")?)
        }

        let err = read_missing().unwrap_err();
        assert!(matches!(err, Error::Io(_)), "got: {err:?}");
        assert!(err.to_string().starts_with("I/O error:"), "got: {err}");
    }

    #[test]
    fn toml_errors_convert_for_question_mark() {
        fn parse(contents: &str) -> Result<toml::Value> {
            Ok(toml::from_str(contents)?)
        }

        let err = parse("base_url = ").unwrap_err();
        assert!(matches!(err, Error::Toml(_)), "got: {err:?}");
        assert!(
            err.to_string().starts_with("TOML parse error:"),
            "got: {err}"
        );
    }
}

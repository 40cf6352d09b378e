//! Error types for the headless runner.
//!
//! The core never fails at runtime; everything here is about getting a
//! usable configuration in front of it.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    /// Config file could not be read
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file parsed but failed validation, or did not parse
    #[error("Invalid config {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    /// Command line overrides produced an invalid configuration
    #[error("Invalid runtime arguments: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, RunnerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RunnerError::ConfigInvalid {
            path: PathBuf::from("config.toml"),
            reason: "Strand count must be positive".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid config config.toml: Strand count must be positive"
        );
    }

    #[test]
    fn test_read_error_keeps_source() {
        let err = RunnerError::ConfigRead {
            path: PathBuf::from("missing.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(std::error::Error::source(&err).is_some());
    }
}

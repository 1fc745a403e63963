// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for otwgen.
//!
//! This module provides strongly-typed errors for the loading, generation and
//! configuration stages, using `thiserror` for ergonomic error definitions and
//! `anyhow` for error propagation in the binary.

use thiserror::Error;

/// Errors that can occur while resolving and loading Go packages.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Pattern matched no packages: {0}")]
    NoPackages(String),

    #[error("Cannot resolve pattern: {0}")]
    PatternNotFound(String),

    #[error("Invalid go.mod at {path}: {message}")]
    InvalidModule { path: String, message: String },

    #[error("Invalid exclude pattern '{pattern}': {message}")]
    InvalidExclude { pattern: String, message: String },

    #[error("Parser initialization failed: {0}")]
    Parser(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

/// Errors that can occur while generating and persisting wrapper files.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("{0} package errors found")]
    PackageDiagnostics(usize),

    #[error("{0} is not a directory")]
    NotADirectory(String),

    #[error("Cannot prepare output directory {path}: {message}")]
    OutputDirectory { path: String, message: String },

    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },

    #[error("Generation cancelled")]
    Cancelled,
}

impl GenerateError {
    /// Create a write error for the given path.
    pub fn write(path: impl AsRef<std::path::Path>, err: impl std::fmt::Display) -> Self {
        Self::Write {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }

    /// Whether this error came from the output directory check.
    pub fn is_output_directory(&self) -> bool {
        matches!(self, Self::NotADirectory(_) | Self::OutputDirectory { .. })
    }
}

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("IO error reading config: {0}")]
    IoError(String),

    #[error("YAML parsing error: {0}")]
    YamlError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::IoError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::YamlError(err.to_string())
    }
}

/// Result type alias using anyhow for flexible error handling.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: LoadError = io_err.into();
        assert!(matches!(err, LoadError::IoError(_)));
    }

    #[test]
    fn test_generate_error_display() {
        assert_eq!(
            GenerateError::PackageDiagnostics(3).to_string(),
            "3 package errors found"
        );
        assert_eq!(
            GenerateError::NotADirectory("out.go".to_string()).to_string(),
            "out.go is not a directory"
        );
    }

    #[test]
    fn test_generate_error_write() {
        let err = GenerateError::write("/tmp/x.go", "disk full");
        assert!(err.to_string().contains("/tmp/x.go"));
        assert!(err.to_string().contains("disk full"));
        assert!(!err.is_output_directory());
        assert!(GenerateError::NotADirectory("x".to_string()).is_output_directory());
    }

    #[test]
    fn test_config_error_from_json() {
        let result: std::result::Result<serde_json::Value, _> = serde_json::from_str("invalid json");
        let json_err = result.unwrap_err();
        let config_err: ConfigError = json_err.into();
        assert!(matches!(config_err, ConfigError::JsonError(_)));
    }

    #[test]
    fn test_config_error_from_io_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let config_err: ConfigError = io_err.into();
        assert!(matches!(config_err, ConfigError::NotFound(_)));
    }
}

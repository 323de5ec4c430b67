// src/error.rs

//! Error types for pkgdep
//!
//! Solver operations never fail: problems with the package set are reported
//! through the solve outcome. These errors only come from loading
//! configuration and from strict parsing helpers.

use thiserror::Error;

/// Errors that can occur outside the solving itself
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error while reading a configuration file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid TOML or has wrong types
    #[error("Failed to parse solver configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration parsed but holds an unusable value
    #[error("Invalid solver configuration: {0}")]
    InvalidConfig(String),

    /// Compare operator string is not one of `=`, `<`, `>`, `<=`, `>=`
    #[error("Invalid compare operator '{0}'")]
    InvalidCompareOp(String),
}

/// Result type for pkgdep operations
pub type Result<T> = std::result::Result<T, Error>;

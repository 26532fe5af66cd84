//! Core error types for screenquest-core.
//!
//! Ledger operations fail synchronously with [`LedgerError`] and never
//! mutate state when they do. Failures of the external assistant are
//! described by [`ExternalServiceError`], which stays inside the
//! collaborator boundary: callers only ever see a downgraded result.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for screenquest-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Ledger / registry errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// External assistant errors
    #[error("External service error: {0}")]
    External(#[from] ExternalServiceError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Errors raised by the ledger engine, habit registry and activity log.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// Negative or otherwise unusable XP/credit amount
    #[error("Invalid amount for '{field}': {value}")]
    InvalidAmount { field: &'static str, value: i64 },

    /// Habit name empty or whitespace-only
    #[error("Habit name must not be empty")]
    InvalidName,

    /// Negative or non-finite duration
    #[error("Invalid duration: {value}")]
    InvalidDuration { value: f64 },

    /// Sleep quality outside 1..=10
    #[error("Invalid sleep quality {value}: expected 1..=10")]
    InvalidQuality { value: u8 },

    /// Unknown habit id
    #[error("Habit not found: {id}")]
    HabitNotFound { id: String },

    /// Snapshot handed to the engine breaks a structural invariant
    #[error("Invalid stats snapshot: {message}")]
    InvalidStats { message: String },

    /// Arithmetic would leave the representable range
    #[error("Overflow while updating '{field}'")]
    Overflow { field: &'static str },
}

impl LedgerError {
    /// True for the input-validation family (rejected before any mutation).
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidAmount { .. }
                | LedgerError::InvalidName
                | LedgerError::InvalidDuration { .. }
                | LedgerError::InvalidQuality { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::HabitNotFound { .. })
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Home/config directory unavailable
    #[error("Configuration directory unavailable: {0}")]
    DirectoryUnavailable(String),
}

/// Failures of the generative assistant behind the sleep advisor and the
/// workout verifier.
#[derive(Error, Debug)]
pub enum ExternalServiceError {
    /// No API key in the configured environment variable
    #[error("API key not configured (set {env_var})")]
    MissingApiKey { env_var: String },

    /// Transport-level failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("Assistant returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body had no usable text part
    #[error("Assistant returned an empty response")]
    EmptyResponse,

    /// Response text was not the expected JSON shape
    #[error("Malformed assistant response: {0}")]
    Malformed(String),

    /// The bounded wait elapsed
    #[error("Assistant call timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

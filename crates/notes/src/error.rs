//! Error types for the edges of the note engine.
//!
//! Reconciliation itself never fails; these cover loading configuration and
//! decoding persisted records.

use thiserror::Error;

/// Errors that can occur when loading [`crate::FootnotesConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or mapping it onto the config schema.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// The shortcut string is empty.
	#[error("shortcut must not be empty")]
	EmptyShortcut,

	/// A delay that must be positive was zero.
	#[error("{0} must be greater than zero")]
	ZeroDelay(&'static str),
}

/// Errors that can occur when decoding persisted note records.
#[derive(Debug, Error)]
pub enum RecordsError {
	/// The payload is not a valid record list.
	#[error("invalid note records: {0}")]
	Json(#[from] serde_json::Error),

	/// Two records in one list share an id.
	#[error("duplicate note id in records: {0}")]
	DuplicateId(String),
}

/// Result type for configuration operations.
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

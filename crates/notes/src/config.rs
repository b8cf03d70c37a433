//! Tune configuration.
//!
//! Hosts pass configuration as TOML (or build it directly). Every field has a
//! default, so an empty document is a valid config:
//!
//! ```toml
//! placeholder = "Write a footnote"
//! shortcut = "CMD+SHIFT+F"
//! debounce_ms = 500
//! hydration_delay_ms = 300
//! removal = "lazy"
//! ```

use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Quiet period before a burst of notifications is reconciled.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Delay before block content is assumed to be populated.
pub const DEFAULT_HYDRATION_DELAY: Duration = Duration::from_millis(300);

/// Default keyboard shortcut; bound by the host, carried here for it.
pub const DEFAULT_SHORTCUT: &str = "CMD+SHIFT+F";

/// When a note whose marker disappeared leaves the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalPolicy {
	/// Keep the entry until the next save, so a marker that comes back (cut
	/// and paste, editor churn) is re-paired with its content.
	#[default]
	Lazy,
	/// Drop the entry in the reconciliation pass that sees the removal.
	Eager,
}

/// Configuration for the footnotes tune.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FootnotesConfig {
	/// Placeholder shown by the panel for empty notes.
	pub placeholder: Option<String>,
	/// Shortcut that inserts a note.
	pub shortcut: String,
	debounce_ms: u64,
	hydration_delay_ms: u64,
	pub removal: RemovalPolicy,
}

impl Default for FootnotesConfig {
	fn default() -> Self {
		Self {
			placeholder: None,
			shortcut: DEFAULT_SHORTCUT.to_string(),
			debounce_ms: millis(DEFAULT_DEBOUNCE),
			hydration_delay_ms: millis(DEFAULT_HYDRATION_DELAY),
			removal: RemovalPolicy::Lazy,
		}
	}
}

impl FootnotesConfig {
	/// Parses and validates a TOML config.
	pub fn from_toml(input: &str) -> Result<Self> {
		let config: Self = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		if self.shortcut.trim().is_empty() {
			return Err(ConfigError::EmptyShortcut);
		}
		if self.debounce_ms == 0 {
			return Err(ConfigError::ZeroDelay("debounce_ms"));
		}
		Ok(())
	}

	pub fn debounce(&self) -> Duration {
		Duration::from_millis(self.debounce_ms)
	}

	pub fn hydration_delay(&self) -> Duration {
		Duration::from_millis(self.hydration_delay_ms)
	}

	pub fn with_debounce(mut self, debounce: Duration) -> Self {
		self.debounce_ms = millis(debounce);
		self
	}

	pub fn with_hydration_delay(mut self, delay: Duration) -> Self {
		self.hydration_delay_ms = millis(delay);
		self
	}

	pub fn with_removal(mut self, removal: RemovalPolicy) -> Self {
		self.removal = removal;
		self
	}
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
fn millis(duration: Duration) -> u64 {
	u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

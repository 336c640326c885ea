//! Session configuration.

use std::time::Duration;

use serde::Deserialize;

/// Errors from loading a [`WorkbenchConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("invalid workbench config: {0}")]
	Toml(#[from] toml::de::Error),
}

/// Per-session settings. Every field has a default, so an empty document is
/// a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkbenchConfig {
	/// Name of the thread that starts the execution target.
	pub loader_thread_name: String,
	/// Name of the thread the local target runs invoked code on.
	pub target_thread_name: String,
	/// Fail blocking calls after this many milliseconds without an answer.
	///
	/// Unset means wait until the target answers or is shut down.
	pub call_timeout_ms: Option<u64>,
	/// Binding name used for constructor results that were not given one.
	pub default_result_name: String,
	/// Capacity of the bench event broadcast channel.
	pub bench_event_buffer: usize,
}

impl Default for WorkbenchConfig {
	fn default() -> Self {
		Self {
			loader_thread_name: "workbench-loader".to_string(),
			target_thread_name: "workbench-target".to_string(),
			call_timeout_ms: None,
			default_result_name: "result".to_string(),
			bench_event_buffer: 64,
		}
	}
}

impl WorkbenchConfig {
	/// Parses a TOML document, filling in defaults for missing keys.
	pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(text)?)
	}

	pub fn call_timeout(&self) -> Option<Duration> {
		self.call_timeout_ms.map(Duration::from_millis)
	}
}

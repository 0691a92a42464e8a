//! Settings builder merging configuration sources by priority.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::Settings;
use crate::sources::{ConfigSource, SourceError};

/// Errors raised while building [`Settings`]
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("Configuration source '{source_name}' failed: {error}")]
	Source {
		source_name: String,
		#[source]
		error: SourceError,
	},

	#[error("Invalid settings: {0}")]
	Invalid(String),
}

/// Builds [`Settings`] from layered sources
///
/// Later sources with the same priority override earlier ones.
#[derive(Default)]
pub struct SettingsBuilder {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl SettingsBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a configuration source
	pub fn add_source(mut self, source: impl ConfigSource + 'static) -> Self {
		self.sources.push(Box::new(source));
		self
	}

	/// Load every source and merge the values, highest priority last
	///
	/// Keys are lower-cased before merging so `ETAG_ENABLED` in one source
	/// and `etag_enabled` in another name the same setting.
	///
	/// # Errors
	///
	/// Returns [`SettingsError::Source`] when a source cannot be loaded.
	pub fn merged(&self) -> Result<IndexMap<String, Value>, SettingsError> {
		let mut ordered: Vec<&dyn ConfigSource> = self.sources.iter().map(|s| s.as_ref()).collect();
		// stable: equal priorities keep insertion order
		ordered.sort_by_key(|s| s.priority());

		let mut merged = IndexMap::new();
		for source in ordered {
			let values = source.load().map_err(|error| SettingsError::Source {
				source_name: source.description(),
				error,
			})?;
			tracing::debug!(
				source = %source.description(),
				keys = values.len(),
				"loaded configuration source"
			);
			merged.extend(values.into_iter().map(|(key, value)| (key.to_lowercase(), value)));
		}
		Ok(merged)
	}

	/// Build the settings
	///
	/// # Errors
	///
	/// Returns [`SettingsError::Invalid`] when a known key has the wrong type
	/// (e.g. `etag_enabled = "sometimes"`).
	pub fn build(self) -> Result<Settings, SettingsError> {
		let merged = self.merged()?;
		let object: Map<String, Value> = merged.into_iter().collect();
		serde_json::from_value(Value::Object(object)).map_err(|e| SettingsError::Invalid(e.to_string()))
	}
}

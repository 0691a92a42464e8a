//! # Settings
//!
//! Configuration for the ETag feature. Settings are merged from layered
//! sources in priority order (environment variables > TOML files >
//! defaults) and deserialized into [`Settings`].
//!
//! ```
//! use rest_etag_conf::Settings;
//! use rest_etag_conf::builder::SettingsBuilder;
//! use rest_etag_conf::sources::DefaultSource;
//! use serde_json::Value;
//!
//! let settings = SettingsBuilder::new()
//!     .add_source(DefaultSource::new().with_value("etag_enabled", Value::Bool(true)))
//!     .build()
//!     .unwrap();
//! assert!(settings.etag_enabled);
//! ```

pub mod builder;
pub mod env;
pub mod sources;

use serde::{Deserialize, Serialize};

pub use builder::{SettingsBuilder, SettingsError};
pub use env::{Env, EnvError, parse_bool};

/// Name of the environment variable toggling the ETag feature
pub const ETAG_ENABLED: &str = "ETAG_ENABLED";

/// Settings consumed by the ETag policy
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// Compute entity tags and enforce `If-Match` / `If-None-Match`.
	///
	/// Disabled by default; when off, views neither set `ETag` headers nor
	/// check preconditions.
	#[serde(alias = "ETAG_ENABLED")]
	pub etag_enabled: bool,
}

impl Settings {
	/// Settings with the ETag feature switched on or off
	pub fn with_etag_enabled(mut self, enabled: bool) -> Self {
		self.etag_enabled = enabled;
		self
	}

	/// Read `ETAG_ENABLED` from the process environment
	///
	/// A missing variable means disabled.
	///
	/// # Errors
	///
	/// Returns [`EnvError::ParseError`] when the variable is set to something
	/// that is not a boolean.
	pub fn from_env() -> Result<Self, EnvError> {
		Self::from_env_with(&Env::new())
	}

	/// Like [`Settings::from_env`], reading through a configured [`Env`]
	/// (e.g. one with a prefix)
	pub fn from_env_with(env: &Env) -> Result<Self, EnvError> {
		let etag_enabled = env.bool_with_default(ETAG_ENABLED, Some(false))?;
		Ok(Self { etag_enabled })
	}
}

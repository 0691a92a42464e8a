//! Exception types for request processing.
//!
//! Every handler, fetch callback and policy check returns [`Result`]. The
//! conditional request outcomes (304, 412, 428) are variants of [`Error`] so
//! they short-circuit with `?` like any other failure.

use hyper::StatusCode;

use crate::serializers::SerializerError;

/// Result alias used across the workspace
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while handling a request
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The representation has not changed since the client's copy.
	///
	/// Carries the current entity tag so it can be echoed on the 304 response.
	#[error("Not modified")]
	NotModified { etag: String },

	/// A mutating request carried an `If-Match` list that does not include
	/// the current entity tag.
	#[error("Precondition failed")]
	PreconditionFailed,

	/// A mutating request carried no `If-Match` header at all.
	#[error("Precondition required")]
	PreconditionRequired,

	/// The view or policy is wired up incorrectly (missing serializer,
	/// missing fetch callback, ...).
	#[error("Improperly configured: {0}")]
	ImproperlyConfigured(String),

	#[error("Serialization error: {0}")]
	Serialization(String),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("HTTP error: {0}")]
	Http(String),
}

impl Error {
	/// HTTP status code this error maps to
	///
	/// # Examples
	///
	/// ```
	/// use rest_etag_core::exception::Error;
	/// use hyper::StatusCode;
	///
	/// assert_eq!(Error::PreconditionFailed.status_code(), StatusCode::PRECONDITION_FAILED);
	/// assert_eq!(Error::PreconditionRequired.status_code(), StatusCode::PRECONDITION_REQUIRED);
	/// ```
	pub fn status_code(&self) -> StatusCode {
		match self {
			Error::NotModified { .. } => StatusCode::NOT_MODIFIED,
			Error::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
			Error::PreconditionRequired => StatusCode::PRECONDITION_REQUIRED,
			Error::NotFound(_) => StatusCode::NOT_FOUND,
			Error::Http(_) => StatusCode::BAD_REQUEST,
			Error::ImproperlyConfigured(_) | Error::Serialization(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}
}

impl From<SerializerError> for Error {
	fn from(err: SerializerError) -> Self {
		Error::Serialization(err.to_string())
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::Serialization(err.to_string())
	}
}

use bytes::Bytes;
use hyper::header::{CONTENT_TYPE, ETAG, HeaderName, HeaderValue};
use hyper::{HeaderMap, StatusCode};
use rest_etag_core::exception::{Error, Result};
use serde::Serialize;

use crate::entity_tag::EntityTag;

/// HTTP Response representation
#[derive(Debug)]
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Response {
	/// Create a new Response with the given status code
	///
	/// # Examples
	///
	/// ```
	/// use rest_etag_http::Response;
	/// use hyper::StatusCode;
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}
	/// Create a Response with HTTP 200 OK status
	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}
	/// Create a Response with HTTP 201 Created status
	pub fn created() -> Self {
		Self::new(StatusCode::CREATED)
	}
	/// Create a Response with HTTP 204 No Content status
	pub fn no_content() -> Self {
		Self::new(StatusCode::NO_CONTENT)
	}
	/// Set the response body
	///
	/// # Examples
	///
	/// ```
	/// use rest_etag_http::Response;
	/// use bytes::Bytes;
	///
	/// let response = Response::ok().with_body("Hello, World!");
	/// assert_eq!(response.body, Bytes::from("Hello, World!"));
	/// ```
	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}
	/// Add a custom header to the response
	///
	/// Invalid names or values are ignored.
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let Ok(header_name) = HeaderName::from_bytes(name.as_bytes())
			&& let Ok(header_value) = HeaderValue::from_str(value)
		{
			self.headers.insert(header_name, header_value);
		}
		self
	}
	/// Set the response body to JSON and add appropriate Content-Type header
	///
	/// # Examples
	///
	/// ```
	/// use rest_etag_http::Response;
	/// use serde_json::json;
	///
	/// let data = json!({"name": "Rex"});
	/// let response = Response::ok().with_json(&data).unwrap();
	///
	/// assert_eq!(
	///     response.headers.get("content-type").unwrap().to_str().unwrap(),
	///     "application/json"
	/// );
	/// ```
	pub fn with_json<T: Serialize + ?Sized>(mut self, data: &T) -> Result<Self> {
		let json = serde_json::to_vec(data).map_err(|e| Error::Serialization(e.to_string()))?;
		self.body = Bytes::from(json);
		self.headers
			.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		Ok(self)
	}
	/// Set the `ETag` header
	///
	/// # Errors
	///
	/// Returns [`Error::Http`] if the tag contains characters not allowed in
	/// a header value.
	pub fn set_etag(&mut self, etag: &EntityTag) -> Result<()> {
		let value = HeaderValue::from_str(&etag.to_string())
			.map_err(|e| Error::Http(format!("Invalid entity tag: {}", e)))?;
		self.headers.insert(ETAG, value);
		Ok(())
	}
	/// The raw `ETag` header value, if set
	///
	/// # Examples
	///
	/// ```
	/// use rest_etag_http::{EntityTag, Response};
	///
	/// let mut response = Response::ok();
	/// assert_eq!(response.etag(), None);
	///
	/// response.set_etag(&EntityTag::strong("abc")).unwrap();
	/// assert_eq!(response.etag(), Some("\"abc\""));
	/// ```
	pub fn etag(&self) -> Option<&str> {
		self.headers.get(ETAG).and_then(|v| v.to_str().ok())
	}
}

impl From<Error> for Response {
	/// Render an error as a response
	///
	/// `304 Not Modified` keeps the entity tag and has no body; everything
	/// else carries a JSON `{"detail": ...}` body.
	fn from(error: Error) -> Self {
		let status = error.status_code();
		if let Error::NotModified { etag } = &error {
			let mut response = Response::new(status);
			if let Err(e) = response.set_etag(&EntityTag::strong(etag.as_str())) {
				tracing::warn!(error = %e, "dropping invalid entity tag from 304 response");
			}
			return response;
		}

		let detail = serde_json::json!({ "detail": error.to_string() });
		match Response::new(status).with_json(&detail) {
			Ok(response) => response,
			Err(_) => Response::new(status).with_body(error.to_string()),
		}
	}
}

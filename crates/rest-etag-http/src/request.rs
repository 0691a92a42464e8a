//! HTTP request representation.

use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue, IF_MATCH, IF_NONE_MATCH};
use hyper::{HeaderMap, Method, Uri, Version};
use rest_etag_core::exception::{Error, Result};
use std::collections::HashMap;

use crate::entity_tag::EntityTagList;

/// HTTP Request representation
#[derive(Debug)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
	/// Path parameters extracted by the router (e.g. `{"id": "42"}`)
	pub path_params: HashMap<String, String>,
}

impl Request {
	/// Create a new request
	pub fn new(method: Method, uri: Uri, version: Version, headers: HeaderMap, body: Bytes) -> Self {
		Self {
			method,
			uri,
			version,
			headers,
			body,
			path_params: HashMap::new(),
		}
	}

	/// Start building a request
	///
	/// # Examples
	///
	/// ```
	/// use rest_etag_http::Request;
	/// use hyper::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::GET)
	///     .uri("/api/pets/1")
	///     .path_param("id", "1")
	///     .build()
	///     .unwrap();
	///
	/// assert_eq!(request.path(), "/api/pets/1");
	/// assert_eq!(request.path_param("id"), Some("1"));
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::default()
	}

	/// Get the request path
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// Get a path parameter by name
	pub fn path_param(&self, name: &str) -> Option<&str> {
		self.path_params.get(name).map(String::as_str)
	}

	/// Set a path parameter (used by routers for path variable extraction)
	pub fn set_path_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.path_params.insert(name.into(), value.into());
	}

	/// Entity tags from all `If-Match` headers
	pub fn if_match(&self) -> EntityTagList {
		EntityTagList::from_headers(&self.headers, &IF_MATCH)
	}

	/// Entity tags from all `If-None-Match` headers
	pub fn if_none_match(&self) -> EntityTagList {
		EntityTagList::from_headers(&self.headers, &IF_NONE_MATCH)
	}

	/// Deserialize the body as JSON
	pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
		serde_json::from_slice(&self.body).map_err(|e| Error::Http(format!("Invalid JSON body: {}", e)))
	}
}

/// Builder for [`Request`]
#[derive(Debug, Default)]
pub struct RequestBuilder {
	method: Method,
	uri: Option<String>,
	version: Version,
	headers: HeaderMap,
	body: Bytes,
	path_params: HashMap<String, String>,
	invalid_header: Option<String>,
}

impl RequestBuilder {
	pub fn method(mut self, method: Method) -> Self {
		self.method = method;
		self
	}

	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());
		self
	}

	pub fn version(mut self, version: Version) -> Self {
		self.version = version;
		self
	}

	/// Replace all headers
	pub fn headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;
		self
	}

	/// Append a header; repeated names keep every value
	pub fn header(mut self, name: &str, value: &str) -> Self {
		match (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			(Ok(name), Ok(value)) => {
				self.headers.append(name, value);
			}
			_ => self.invalid_header = Some(name.to_string()),
		}
		self
	}

	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	pub fn path_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.path_params.insert(name.into(), value.into());
		self
	}

	/// Build the request
	///
	/// # Errors
	///
	/// Returns [`Error::Http`] when the URI or a header is invalid.
	pub fn build(self) -> Result<Request> {
		if let Some(name) = self.invalid_header {
			return Err(Error::Http(format!("Invalid header: {}", name)));
		}
		let uri = match self.uri {
			Some(uri) => uri
				.parse::<Uri>()
				.map_err(|e| Error::Http(format!("Invalid URI '{}': {}", uri, e)))?,
			None => Uri::from_static("/"),
		};

		let mut request = Request::new(self.method, uri, self.version, self.headers, self.body);
		request.path_params = self.path_params;
		Ok(request)
	}
}

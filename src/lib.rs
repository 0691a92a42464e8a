//! # rest-etag
//!
//! Conditional request support for REST APIs using entity tags.
//!
//! Responses are tagged with the SHA-1 fingerprint of their representation.
//! Clients send the tag back:
//!
//! - `If-None-Match` on `GET`/`HEAD` turns an unchanged read into
//!   `304 Not Modified`
//! - `If-Match` is required on `PUT`, `PATCH` and `DELETE`; a missing header
//!   yields `428 Precondition Required` and a stale one `412 Precondition
//!   Failed`
//!
//! The feature is off unless `ETAG_ENABLED` is set.
//!
//! ## Feature Flags
//!
//! - `conf` - settings loading (`ETAG_ENABLED` from environment and TOML)
//! - `views` - the ETag policy and [`ResourceView`]
//! - `full` (default) - everything
//!
//! ## Quick Example
//!
//! ```
//! use async_trait::async_trait;
//! use rest_etag::{
//!     Endpoint, EtagPolicy, Handler, JsonSerializer, Rendered, Request, ResourceView, Result,
//! };
//! use serde_json::{Value, json};
//!
//! struct Pet;
//!
//! #[async_trait]
//! impl Endpoint<Value> for Pet {
//!     async fn call(&self, _request: Request) -> Result<Rendered<Value>> {
//!         Ok(Rendered::ok(json!({"id": 1, "name": "Rex"})))
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let view = ResourceView::builder()
//!     .endpoint(Pet)
//!     .schema(JsonSerializer::<Value>::new())
//!     .policy(EtagPolicy::new(true))
//!     .build()
//!     .unwrap();
//!
//! let response = view.handle(Request::builder().build().unwrap()).await.unwrap();
//! assert_eq!(
//!     response.etag(),
//!     Some("\"d39d9a07d19e13256b529b00495e5b38e8f29b99\"")
//! );
//! # });
//! ```

pub use rest_etag_core as core;
pub use rest_etag_http as http;

#[cfg(feature = "conf")]
pub use rest_etag_conf as conf;

#[cfg(feature = "views")]
pub use rest_etag_views as views;

pub use rest_etag_core::exception::{Error, Result};
pub use rest_etag_core::serializers::{FieldsSerializer, JsonSerializer, Serializer, SerializerError};

pub use rest_etag_http::{
	EntityTag, EntityTagList, Handler, Middleware, MiddlewareChain, Request, RequestBuilder, Response,
};

#[cfg(feature = "conf")]
pub use rest_etag_conf::{ETAG_ENABLED, Settings, SettingsBuilder, SettingsError};

#[cfg(feature = "views")]
pub use rest_etag_views::{
	Endpoint, EtagPolicy, GetItem, Rendered, ResourceView, ResourceViewBuilder, compute_fingerprint,
};

pub use hyper::{Method, StatusCode};

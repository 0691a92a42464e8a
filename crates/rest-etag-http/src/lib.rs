//! # rest-etag-http
//!
//! Request and response types plus the handler/middleware seams the ETag
//! views plug into.
//!
//! ## Entity tags
//!
//! [`EntityTagList`] parses `If-Match` / `If-None-Match` values, including
//! weak tags (`W/"..."`), the `*` wildcard and lists spread over several
//! header lines:
//!
//! ```
//! use rest_etag_http::Request;
//! use hyper::Method;
//!
//! let request = Request::builder()
//!     .method(Method::PUT)
//!     .uri("/pets/1")
//!     .header("if-match", "\"abc\", W/\"def\"")
//!     .build()
//!     .unwrap();
//!
//! let if_match = request.if_match();
//! assert!(if_match.contains("abc"));
//! assert!(!if_match.contains("def"));
//! ```

pub mod entity_tag;
pub mod middleware;
pub mod request;
pub mod response;

pub use entity_tag::{EntityTag, EntityTagList};
pub use middleware::{Handler, Middleware, MiddlewareChain};
pub use request::{Request, RequestBuilder};
pub use response::Response;

pub use rest_etag_core::exception::{Error, Result};

//! Handler and middleware traits.
//!
//! Conditional outcomes travel as errors so that views can return early;
//! a middleware at the edge turns them back into responses:
//!
//! ```rust
//! use async_trait::async_trait;
//! use rest_etag_http::{Handler, Middleware, Request, Response};
//! use rest_etag_core::exception::Result;
//! use std::sync::Arc;
//!
//! struct RenderErrors;
//!
//! #[async_trait]
//! impl Middleware for RenderErrors {
//!     async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
//!         Ok(next.handle(request).await.unwrap_or_else(Response::from))
//!     }
//! }
//! ```

use async_trait::async_trait;
use rest_etag_core::exception::Result;
use std::sync::Arc;

use crate::{Request, Response};

/// Handler trait for processing requests.
#[async_trait]
pub trait Handler: Send + Sync {
	/// Handles an HTTP request and produces a response.
	///
	/// # Errors
	///
	/// Returns an error if the request cannot be processed, including the
	/// conditional outcomes (304, 412, 428).
	async fn handle(&self, request: Request) -> Result<Response>;
}

/// Wraps the handler that follows it in a [`MiddlewareChain`].
#[async_trait]
pub trait Middleware: Send + Sync {
	/// # Errors
	///
	/// Returns an error if the middleware or next handler fails.
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response>;
}

/// A handler wrapped in middleware
///
/// Each middleware added wraps everything added before it, so the last one
/// added sees the request first.
pub struct MiddlewareChain {
	handler: Arc<dyn Handler>,
}

impl MiddlewareChain {
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self { handler }
	}

	pub fn with_middleware(self, middleware: Arc<dyn Middleware>) -> Self {
		Self {
			handler: Arc::new(Wrapped {
				middleware,
				next: self.handler,
			}),
		}
	}
}

#[async_trait]
impl Handler for MiddlewareChain {
	async fn handle(&self, request: Request) -> Result<Response> {
		self.handler.handle(request).await
	}
}

struct Wrapped {
	middleware: Arc<dyn Middleware>,
	next: Arc<dyn Handler>,
}

#[async_trait]
impl Handler for Wrapped {
	async fn handle(&self, request: Request) -> Result<Response> {
		self.middleware.process(request, self.next.clone()).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::EntityTag;
	use hyper::{Method, StatusCode};
	use rest_etag_core::exception::Error;
	use rstest::rstest;

	struct Tagged;

	#[async_trait]
	impl Handler for Tagged {
		async fn handle(&self, _request: Request) -> Result<Response> {
			let mut response = Response::ok().with_body("Data");
			response.set_etag(&EntityTag::strong("v1"))?;
			Ok(response)
		}
	}

	struct Failing(fn() -> Error);

	#[async_trait]
	impl Handler for Failing {
		async fn handle(&self, _request: Request) -> Result<Response> {
			Err((self.0)())
		}
	}

	struct Prefix(&'static str);

	#[async_trait]
	impl Middleware for Prefix {
		async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
			let response = next.handle(request).await?;
			let body = String::from_utf8(response.body.to_vec()).unwrap_or_default();
			Ok(Response::ok().with_body(format!("{}{}", self.0, body)))
		}
	}

	struct RenderErrors;

	#[async_trait]
	impl Middleware for RenderErrors {
		async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
			Ok(next.handle(request).await.unwrap_or_else(Response::from))
		}
	}

	fn get() -> Request {
		Request::builder().method(Method::GET).build().unwrap()
	}

	#[rstest]
	#[tokio::test]
	async fn test_chain_without_middleware_is_the_handler() {
		let chain = MiddlewareChain::new(Arc::new(Tagged));
		let response = chain.handle(get()).await.unwrap();
		assert_eq!(response.body, "Data");
		assert_eq!(response.etag(), Some("\"v1\""));
	}

	#[rstest]
	#[tokio::test]
	async fn test_last_added_runs_outermost() {
		let chain = MiddlewareChain::new(Arc::new(Tagged))
			.with_middleware(Arc::new(Prefix("inner:")))
			.with_middleware(Arc::new(Prefix("outer:")));

		let response = chain.handle(get()).await.unwrap();
		assert_eq!(response.body, "outer:inner:Data");
	}

	#[rstest]
	#[case(|| Error::NotModified { etag: "v1".to_string() }, StatusCode::NOT_MODIFIED)]
	#[case(|| Error::PreconditionFailed, StatusCode::PRECONDITION_FAILED)]
	#[case(|| Error::PreconditionRequired, StatusCode::PRECONDITION_REQUIRED)]
	#[tokio::test]
	async fn test_conditional_errors_are_rendered(
		#[case] error: fn() -> Error,
		#[case] status: StatusCode,
	) {
		let chain = MiddlewareChain::new(Arc::new(Failing(error))).with_middleware(Arc::new(RenderErrors));

		let response = chain.handle(get()).await.unwrap();
		assert_eq!(response.status, status);
		if status == StatusCode::NOT_MODIFIED {
			assert_eq!(response.etag(), Some("\"v1\""));
			assert!(response.body.is_empty());
		}
	}
}

//! Resource view applying the ETag policy around an endpoint.
//!
//! A [`ResourceView`] runs in this order:
//!
//! 1. on `PUT`, `PATCH` and `DELETE` (policy enabled) fetch the current item
//!    through [`GetItem`] and check `If-Match` against it
//! 2. call the [`Endpoint`]
//! 3. render the returned item with the response schema
//! 4. check `If-None-Match` (reads) and set the `ETag` header, fingerprinting
//!    through the ETag schema
//!
//! ```
//! use async_trait::async_trait;
//! use rest_etag_core::exception::Result;
//! use rest_etag_core::serializers::JsonSerializer;
//! use rest_etag_http::{Handler, Request};
//! use rest_etag_views::{Endpoint, EtagPolicy, Rendered, ResourceView};
//! use serde_json::{Value, json};
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl Endpoint<Value> for Hello {
//!     async fn call(&self, _request: Request) -> Result<Rendered<Value>> {
//!         Ok(Rendered::ok(json!({"hello": "world"})))
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let view = ResourceView::builder()
//!     .endpoint(Hello)
//!     .schema(JsonSerializer::<Value>::new())
//!     .policy(EtagPolicy::new(true))
//!     .build()
//!     .unwrap();
//!
//! let response = view.handle(Request::builder().build().unwrap()).await.unwrap();
//! assert!(response.etag().is_some());
//! # });
//! ```

use async_trait::async_trait;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, StatusCode};
use rest_etag_conf::Settings;
use rest_etag_core::exception::{Error, Result};
use rest_etag_core::serializers::Serializer;
use rest_etag_http::{Handler, Request, Response};
use serde_json::Value;
use std::sync::Arc;

use crate::etag::EtagPolicy;

/// Serializer shared between a view and its builder
pub type SharedSchema<T> = Arc<dyn Serializer<Input = T, Output = Value> + Send + Sync>;

/// What an endpoint returns: the status, the item to render and any extra
/// headers
#[derive(Debug)]
pub struct Rendered<T> {
	pub status: StatusCode,
	pub item: Option<T>,
	pub headers: HeaderMap,
}

impl<T> Rendered<T> {
	pub fn new(status: StatusCode, item: Option<T>) -> Self {
		Self {
			status,
			item,
			headers: HeaderMap::new(),
		}
	}

	/// `200 OK` with `item` as body
	pub fn ok(item: T) -> Self {
		Self::new(StatusCode::OK, Some(item))
	}

	/// `201 Created` with `item` as body
	pub fn created(item: T) -> Self {
		Self::new(StatusCode::CREATED, Some(item))
	}

	/// `204 No Content`, nothing to render or tag
	pub fn no_content() -> Self {
		Self::new(StatusCode::NO_CONTENT, None)
	}

	/// Add a header to the response
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
}

/// The body of a view
#[async_trait]
pub trait Endpoint<T>: Send + Sync {
	/// # Errors
	///
	/// Any error is propagated to the caller unchanged.
	async fn call(&self, request: Request) -> Result<Rendered<T>>;
}

/// Loads the current state of the resource addressed by a request
///
/// Implemented for plain closures:
///
/// ```
/// use rest_etag_core::exception::{Error, Result};
/// use rest_etag_http::Request;
/// use rest_etag_views::GetItem;
/// use serde_json::{Value, json};
///
/// fn assert_get_item<G: GetItem<Value>>(_: &G) {}
///
/// let lookup = |request: &Request| -> Result<Value> {
///     match request.path_param("id") {
///         Some(id) => Ok(json!({ "id": id })),
///         None => Err(Error::NotFound("no id".to_string())),
///     }
/// };
/// assert_get_item(&lookup);
/// ```
#[async_trait]
pub trait GetItem<T>: Send + Sync {
	/// # Errors
	///
	/// Typically [`Error::NotFound`]; propagated to the caller unchanged.
	async fn get_item(&self, request: &Request) -> Result<T>;
}

#[async_trait]
impl<T, F> GetItem<T> for F
where
	F: Fn(&Request) -> Result<T> + Send + Sync,
	T: Send + 'static,
{
	async fn get_item(&self, request: &Request) -> Result<T> {
		(self)(request)
	}
}

/// Handler running an [`Endpoint`] under the ETag policy
pub struct ResourceView<T> {
	endpoint: Arc<dyn Endpoint<T>>,
	schema: SharedSchema<T>,
	etag_schema: Option<SharedSchema<T>>,
	get_item: Option<Arc<dyn GetItem<T>>>,
	policy: EtagPolicy,
}

impl<T> ResourceView<T> {
	pub fn builder() -> ResourceViewBuilder<T> {
		ResourceViewBuilder::default()
	}

	pub fn policy(&self) -> EtagPolicy {
		self.policy
	}

	/// Schema used for fingerprints, falling back to the response schema
	fn fingerprint_schema(&self) -> &(dyn Serializer<Input = T, Output = Value> + Send + Sync) {
		self.etag_schema.as_deref().unwrap_or(&*self.schema)
	}
}

#[async_trait]
impl<T> Handler for ResourceView<T>
where
	T: Send + Sync + 'static,
{
	async fn handle(&self, request: Request) -> Result<Response> {
		let method = request.method.clone();
		let if_none_match = request.if_none_match();

		if self.policy.requires_precondition(&method) {
			let get_item = self.get_item.as_ref().ok_or_else(|| {
				Error::ImproperlyConfigured(format!(
					"{} {} requires a get_item callback to check If-Match",
					method,
					request.path()
				))
			})?;
			let current = get_item.get_item(&request).await?;
			self.policy.validate_precondition(
				&method,
				self.fingerprint_schema(),
				&current,
				&request.if_match(),
			)?;
		}

		let rendered = self.endpoint.call(request).await?;

		let mut response = match &rendered.item {
			Some(item) => {
				let body = self.schema.serialize(item)?;
				Response::new(rendered.status).with_json(&body)?
			}
			None => Response::new(rendered.status),
		};
		response.headers.extend(rendered.headers);

		self.policy.annotate_response(
			&method,
			&if_none_match,
			&mut response,
			self.fingerprint_schema(),
			rendered.item.as_ref(),
		)?;
		Ok(response)
	}
}

/// Builder for [`ResourceView`]
pub struct ResourceViewBuilder<T> {
	endpoint: Option<Arc<dyn Endpoint<T>>>,
	schema: Option<SharedSchema<T>>,
	etag_schema: Option<SharedSchema<T>>,
	get_item: Option<Arc<dyn GetItem<T>>>,
	policy: EtagPolicy,
}

impl<T> Default for ResourceViewBuilder<T> {
	fn default() -> Self {
		Self {
			endpoint: None,
			schema: None,
			etag_schema: None,
			get_item: None,
			policy: EtagPolicy::default(),
		}
	}
}

impl<T> ResourceViewBuilder<T> {
	pub fn endpoint(mut self, endpoint: impl Endpoint<T> + 'static) -> Self {
		self.endpoint = Some(Arc::new(endpoint));
		self
	}

	/// Serializer rendering the response body
	pub fn schema(mut self, schema: impl Serializer<Input = T, Output = Value> + Send + Sync + 'static) -> Self {
		self.schema = Some(Arc::new(schema));
		self
	}

	/// Serializer used only for fingerprints
	///
	/// Defaults to the response schema.
	pub fn etag_schema(
		mut self,
		schema: impl Serializer<Input = T, Output = Value> + Send + Sync + 'static,
	) -> Self {
		self.etag_schema = Some(Arc::new(schema));
		self
	}

	pub fn get_item(mut self, get_item: impl GetItem<T> + 'static) -> Self {
		self.get_item = Some(Arc::new(get_item));
		self
	}

	pub fn policy(mut self, policy: EtagPolicy) -> Self {
		self.policy = policy;
		self
	}

	/// Take the policy from `ETAG_ENABLED`
	pub fn settings(self, settings: &Settings) -> Self {
		self.policy(EtagPolicy::from_settings(settings))
	}

	/// # Errors
	///
	/// Returns [`Error::ImproperlyConfigured`] when the endpoint or the
	/// schema is missing.
	pub fn build(self) -> Result<ResourceView<T>> {
		let endpoint = self
			.endpoint
			.ok_or_else(|| Error::ImproperlyConfigured("ResourceView requires an endpoint".to_string()))?;
		let schema = self
			.schema
			.ok_or_else(|| Error::ImproperlyConfigured("ResourceView requires a schema".to_string()))?;

		Ok(ResourceView {
			endpoint,
			schema,
			etag_schema: self.etag_schema,
			get_item: self.get_item,
			policy: self.policy,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::etag::fingerprint_item;
	use hyper::Method;
	use rest_etag_core::serializers::{FieldsSerializer, JsonSerializer};
	use rstest::{fixture, rstest};
	use serde::{Deserialize, Serialize};
	use std::collections::HashMap;
	use std::sync::Mutex;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
	struct Pet {
		id: u64,
		name: String,
		views: u64,
	}

	#[derive(Deserialize)]
	struct Rename {
		name: String,
	}

	type Store = Arc<Mutex<HashMap<u64, Pet>>>;

	fn pet_id(request: &Request) -> Result<u64> {
		request
			.path_param("id")
			.and_then(|id| id.parse().ok())
			.ok_or_else(|| Error::Http("invalid pet id".to_string()))
	}

	fn lookup(store: &Store, request: &Request) -> Result<Pet> {
		let id = pet_id(request)?;
		store
			.lock()
			.unwrap()
			.get(&id)
			.cloned()
			.ok_or_else(|| Error::NotFound(format!("pet {}", id)))
	}

	struct PetEndpoint {
		store: Store,
		calls: Arc<AtomicUsize>,
		count_views: bool,
	}

	#[async_trait]
	impl Endpoint<Pet> for PetEndpoint {
		async fn call(&self, request: Request) -> Result<Rendered<Pet>> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			let id = pet_id(&request)?;
			let mut pets = self.store.lock().unwrap();
			match request.method {
				Method::GET | Method::HEAD => {
					let pet = pets
						.get_mut(&id)
						.ok_or_else(|| Error::NotFound(format!("pet {}", id)))?;
					if self.count_views {
						pet.views += 1;
					}
					Ok(Rendered::ok(pet.clone()))
				}
				Method::PUT => {
					let rename: Rename = request.json()?;
					let pet = pets
						.get_mut(&id)
						.ok_or_else(|| Error::NotFound(format!("pet {}", id)))?;
					pet.name = rename.name;
					Ok(Rendered::ok(pet.clone()).with_header("x-updated", "1"))
				}
				Method::DELETE => {
					pets.remove(&id);
					Ok(Rendered::no_content())
				}
				_ => Err(Error::Http(format!("{} not allowed", request.method))),
			}
		}
	}

	struct PetLookup {
		store: Store,
		calls: Arc<AtomicUsize>,
	}

	#[async_trait]
	impl GetItem<Pet> for PetLookup {
		async fn get_item(&self, request: &Request) -> Result<Pet> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			lookup(&self.store, request)
		}
	}

	struct Pets {
		store: Store,
		endpoint_calls: Arc<AtomicUsize>,
		lookup_calls: Arc<AtomicUsize>,
	}

	impl Pets {
		fn endpoint(&self, count_views: bool) -> PetEndpoint {
			PetEndpoint {
				store: self.store.clone(),
				calls: self.endpoint_calls.clone(),
				count_views,
			}
		}

		fn lookup(&self) -> PetLookup {
			PetLookup {
				store: self.store.clone(),
				calls: self.lookup_calls.clone(),
			}
		}

		fn view(&self, policy: EtagPolicy) -> ResourceView<Pet> {
			ResourceView::<Pet>::builder()
				.endpoint(self.endpoint(false))
				.schema(JsonSerializer::<Pet>::new())
				.get_item(self.lookup())
				.policy(policy)
				.build()
				.unwrap()
		}

		fn current(&self) -> Pet {
			self.store.lock().unwrap().get(&1).cloned().unwrap()
		}

		fn current_etag(&self) -> String {
			format!(
				"\"{}\"",
				fingerprint_item(&JsonSerializer::<Pet>::new(), &self.current()).unwrap()
			)
		}
	}

	#[fixture]
	fn pets() -> Pets {
		let mut pets = HashMap::new();
		pets.insert(
			1,
			Pet {
				id: 1,
				name: "Rex".to_string(),
				views: 0,
			},
		);
		Pets {
			store: Arc::new(Mutex::new(pets)),
			endpoint_calls: Arc::new(AtomicUsize::new(0)),
			lookup_calls: Arc::new(AtomicUsize::new(0)),
		}
	}

	fn request(method: Method, headers: &[(&str, &str)], body: &str) -> Request {
		let mut builder = Request::builder()
			.method(method)
			.uri("/pets/1")
			.path_param("id", "1")
			.body(body.to_string());
		for (name, value) in headers {
			builder = builder.header(name, value);
		}
		builder.build().unwrap()
	}

	#[rstest]
	#[tokio::test]
	async fn test_get_sets_etag_of_rendered_item(pets: Pets) {
		let view = pets.view(EtagPolicy::new(true));

		let response = view.handle(request(Method::GET, &[], "")).await.unwrap();

		assert_eq!(response.status, StatusCode::OK);
		let body: Pet = serde_json::from_slice(&response.body).unwrap();
		assert_eq!(body, pets.current());
		assert_eq!(response.etag(), Some(pets.current_etag().as_str()));
		// reads never fetch through get_item
		assert_eq!(pets.lookup_calls.load(Ordering::SeqCst), 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_get_if_none_match(pets: Pets) {
		let view = pets.view(EtagPolicy::new(true));
		let etag = pets.current_etag();

		let err = view
			.handle(request(Method::GET, &[("if-none-match", &etag)], ""))
			.await
			.unwrap_err();
		match err {
			Error::NotModified { etag: current } => assert_eq!(format!("\"{}\"", current), etag),
			other => panic!("unexpected error: {other}"),
		}

		let response = view
			.handle(request(Method::GET, &[("if-none-match", "\"stale\"")], ""))
			.await
			.unwrap();
		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(response.etag(), Some(etag.as_str()));
	}

	#[rstest]
	#[tokio::test]
	async fn test_put_without_if_match_is_rejected(pets: Pets) {
		let view = pets.view(EtagPolicy::new(true));

		let err = view
			.handle(request(Method::PUT, &[], r#"{"name": "Max"}"#))
			.await
			.unwrap_err();

		assert!(matches!(err, Error::PreconditionRequired));
		assert_eq!(err.status_code(), StatusCode::PRECONDITION_REQUIRED);
		assert_eq!(pets.endpoint_calls.load(Ordering::SeqCst), 0);
		assert_eq!(pets.current().name, "Rex");
	}

	#[rstest]
	#[tokio::test]
	async fn test_put_with_stale_if_match_is_rejected(pets: Pets) {
		let view = pets.view(EtagPolicy::new(true));

		let err = view
			.handle(request(
				Method::PUT,
				&[("if-match", "\"0000000000000000000000000000000000000000\"")],
				r#"{"name": "Max"}"#,
			))
			.await
			.unwrap_err();

		assert!(matches!(err, Error::PreconditionFailed));
		assert_eq!(pets.lookup_calls.load(Ordering::SeqCst), 1);
		assert_eq!(pets.endpoint_calls.load(Ordering::SeqCst), 0);
		assert_eq!(pets.current().name, "Rex");
	}

	#[rstest]
	#[tokio::test]
	async fn test_put_with_current_if_match_updates(pets: Pets) {
		let view = pets.view(EtagPolicy::new(true));
		let before = pets.current_etag();

		let response = view
			.handle(request(Method::PUT, &[("if-match", &before)], r#"{"name": "Max"}"#))
			.await
			.unwrap();

		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(pets.current().name, "Max");
		assert_eq!(response.headers.get("x-updated").unwrap(), "1");
		let after = pets.current_etag();
		assert_ne!(before, after);
		assert_eq!(response.etag(), Some(after.as_str()));
	}

	#[rstest]
	#[tokio::test]
	async fn test_delete_with_current_if_match(pets: Pets) {
		let view = pets.view(EtagPolicy::new(true));
		let etag = pets.current_etag();

		let response = view
			.handle(request(Method::DELETE, &[("if-match", &etag)], ""))
			.await
			.unwrap();

		assert_eq!(response.status, StatusCode::NO_CONTENT);
		assert_eq!(response.etag(), None);
		assert!(response.body.is_empty());
		assert!(pets.store.lock().unwrap().is_empty());
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_item_surfaces_not_found(pets: Pets) {
		let view = pets.view(EtagPolicy::new(true));
		let request = Request::builder()
			.method(Method::PATCH)
			.uri("/pets/2")
			.path_param("id", "2")
			.header("if-match", "*")
			.build()
			.unwrap();

		let err = view.handle(request).await.unwrap_err();
		assert!(matches!(err, Error::NotFound(_)));
	}

	#[rstest]
	#[case(Method::PUT, r#"{"name": "Max"}"#, StatusCode::OK)]
	#[case(Method::DELETE, "", StatusCode::NO_CONTENT)]
	#[tokio::test]
	async fn test_disabled_policy_skips_everything(
		pets: Pets,
		#[case] method: Method,
		#[case] body: &str,
		#[case] status: StatusCode,
	) {
		let view = pets.view(EtagPolicy::new(false));

		let response = view.handle(request(method, &[], body)).await.unwrap();

		assert_eq!(response.status, status);
		assert_eq!(response.etag(), None);
		assert_eq!(pets.lookup_calls.load(Ordering::SeqCst), 0);
	}

	#[rstest]
	#[tokio::test]
	async fn test_disabled_get_ignores_if_none_match(pets: Pets) {
		let view = pets.view(EtagPolicy::new(false));

		let response = view
			.handle(request(Method::GET, &[("if-none-match", "*")], ""))
			.await
			.unwrap();

		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(response.etag(), None);
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_get_item_fails_only_when_needed(pets: Pets) {
		let enabled = ResourceView::<Pet>::builder()
			.endpoint(pets.endpoint(false))
			.schema(JsonSerializer::<Pet>::new())
			.settings(&Settings::default().with_etag_enabled(true))
			.build()
			.unwrap();
		assert!(enabled.policy().is_enabled());

		enabled.handle(request(Method::GET, &[], "")).await.unwrap();
		let err = enabled
			.handle(request(Method::PUT, &[("if-match", "*")], r#"{"name": "Max"}"#))
			.await
			.unwrap_err();
		assert!(matches!(err, Error::ImproperlyConfigured(ref msg) if msg.contains("/pets/1")));

		let disabled = ResourceView::<Pet>::builder()
			.endpoint(pets.endpoint(false))
			.schema(JsonSerializer::<Pet>::new())
			.settings(&Settings::default())
			.build()
			.unwrap();
		disabled
			.handle(request(Method::PUT, &[], r#"{"name": "Max"}"#))
			.await
			.unwrap();
	}

	#[rstest]
	fn test_build_requires_endpoint_and_schema(pets: Pets) {
		let err = ResourceView::<Pet>::builder()
			.schema(JsonSerializer::<Pet>::new())
			.build()
			.err()
			.unwrap();
		assert!(matches!(err, Error::ImproperlyConfigured(ref msg) if msg.contains("endpoint")));

		let err = ResourceView::<Pet>::builder().endpoint(pets.endpoint(false)).build().err().unwrap();
		assert!(matches!(err, Error::ImproperlyConfigured(ref msg) if msg.contains("schema")));
	}

	#[rstest]
	#[tokio::test]
	async fn test_etag_schema_ignores_volatile_fields(pets: Pets) {
		let view = ResourceView::<Pet>::builder()
			.endpoint(pets.endpoint(true))
			.schema(JsonSerializer::<Pet>::new())
			.etag_schema(FieldsSerializer::new(JsonSerializer::<Pet>::new(), ["id", "name"]))
			.policy(EtagPolicy::new(true))
			.build()
			.unwrap();

		let first = view.handle(request(Method::GET, &[], "")).await.unwrap();
		let etag = first.etag().unwrap().to_string();

		let err = view
			.handle(request(Method::GET, &[("if-none-match", &etag)], ""))
			.await
			.unwrap_err();
		assert!(matches!(err, Error::NotModified { .. }));
		// the endpoint ran and bumped the counter, the tag did not move
		assert_eq!(pets.current().views, 2);
	}

	#[rstest]
	#[tokio::test]
	async fn test_closure_get_item(pets: Pets) {
		let store = pets.store.clone();
		let view = ResourceView::<Pet>::builder()
			.endpoint(pets.endpoint(false))
			.schema(JsonSerializer::<Pet>::new())
			.get_item(move |request: &Request| -> Result<Pet> { lookup(&store, request) })
			.policy(EtagPolicy::new(true))
			.build()
			.unwrap();

		let err = view
			.handle(request(Method::PUT, &[("if-match", "\"nope\"")], r#"{"name": "Max"}"#))
			.await
			.unwrap_err();
		assert!(matches!(err, Error::PreconditionFailed));

		let etag = pets.current_etag();
		view.handle(request(Method::PUT, &[("if-match", &etag)], r#"{"name": "Max"}"#))
			.await
			.unwrap();
		assert_eq!(pets.current().name, "Max");
	}

	#[rstest]
	fn test_rendered_constructors() {
		let ok = Rendered::ok(1);
		assert_eq!((ok.status, ok.item), (StatusCode::OK, Some(1)));

		let created = Rendered::created(2).with_header("location", "/pets/2");
		assert_eq!(created.status, StatusCode::CREATED);
		assert_eq!(created.headers.get("location").unwrap(), "/pets/2");

		let empty = Rendered::<i32>::no_content().with_header("bad header", "x");
		assert_eq!(empty.status, StatusCode::NO_CONTENT);
		assert!(empty.item.is_none());
		assert!(empty.headers.is_empty());
	}
}

//! Serializer trait and implementations
//!
//! A serializer plays the role of a schema: it turns a domain object into the
//! structured representation ([`serde_json::Value`]) that is rendered into a
//! response body and fingerprinted for entity tags.

use serde::Serialize;
use serde_json::{Map, Value};
use std::marker::PhantomData;

/// Converts a domain object into its representation
///
/// # Examples
///
/// ```
/// use rest_etag_core::serializers::{JsonSerializer, Serializer};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Pet { id: i64, name: String }
///
/// let pet = Pet { id: 1, name: "Rex".to_string() };
/// let serializer = JsonSerializer::<Pet>::new();
/// let value = serializer.serialize(&pet).unwrap();
/// assert_eq!(value["name"], "Rex");
/// ```
pub trait Serializer {
	type Input;
	type Output;

	fn serialize(&self, input: &Self::Input) -> Result<Self::Output, SerializerError>;
}

/// Errors that can occur during serialization
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SerializerError {
	/// Serde serialization error
	#[error("Serde error: {message}")]
	Serde { message: String },
	/// Other error
	#[error("Serialization error: {message}")]
	Other { message: String },
}

impl SerializerError {
	/// Create a new generic serializer error
	pub fn new(message: String) -> Self {
		SerializerError::Other { message }
	}
}

/// JSON serializer implementation
///
/// Produces a [`Value`] through serde, so any `Serialize` type can be used as
/// a resource.
#[derive(Debug, Clone)]
pub struct JsonSerializer<T> {
	_phantom: PhantomData<fn() -> T>,
}

impl<T> JsonSerializer<T> {
	/// Create a new JSON serializer
	pub fn new() -> Self {
		Self {
			_phantom: PhantomData,
		}
	}
}

impl<T> Default for JsonSerializer<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Serializer for JsonSerializer<T>
where
	T: Serialize,
{
	type Input = T;
	type Output = Value;

	fn serialize(&self, input: &Self::Input) -> Result<Self::Output, SerializerError> {
		serde_json::to_value(input).map_err(|e| SerializerError::Serde {
			message: format!("Serialization error: {}", e),
		})
	}
}

/// Serializer restricted to a subset of fields
///
/// Wraps another serializer and keeps only the listed top-level fields of its
/// object output. Used as an ETag schema so that volatile fields (counters,
/// access timestamps) do not change the fingerprint.
///
/// # Examples
///
/// ```
/// use rest_etag_core::serializers::{FieldsSerializer, JsonSerializer, Serializer};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Pet { id: i64, name: String, views: u64 }
///
/// let schema = FieldsSerializer::new(JsonSerializer::<Pet>::new(), ["id", "name"]);
/// let value = schema
///     .serialize(&Pet { id: 1, name: "Rex".to_string(), views: 42 })
///     .unwrap();
/// assert!(value.get("views").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct FieldsSerializer<S> {
	inner: S,
	fields: Vec<String>,
}

impl<S> FieldsSerializer<S> {
	pub fn new<I, F>(inner: S, fields: I) -> Self
	where
		I: IntoIterator<Item = F>,
		F: Into<String>,
	{
		Self {
			inner,
			fields: fields.into_iter().map(Into::into).collect(),
		}
	}

	/// Fields kept in the output
	pub fn fields(&self) -> &[String] {
		&self.fields
	}
}

impl<S> Serializer for FieldsSerializer<S>
where
	S: Serializer<Output = Value>,
{
	type Input = S::Input;
	type Output = Value;

	fn serialize(&self, input: &Self::Input) -> Result<Self::Output, SerializerError> {
		match self.inner.serialize(input)? {
			Value::Object(mut object) => {
				let mut selected = Map::new();
				for field in &self.fields {
					if let Some(value) = object.remove(field) {
						selected.insert(field.clone(), value);
					}
				}
				Ok(Value::Object(selected))
			}
			other => Err(SerializerError::new(format!(
				"field selection requires an object representation, got {}",
				kind_of(&other)
			))),
		}
	}
}

fn kind_of(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

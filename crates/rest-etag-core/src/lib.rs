//! # rest-etag-core
//!
//! Core components shared by the rest-etag crates: the exception type every
//! handler returns, and the serializer seam that turns domain objects into
//! the representation a fingerprint is computed from.

pub mod exception;
pub mod serializers;

pub use exception::{Error, Result};
pub use serializers::{FieldsSerializer, JsonSerializer, Serializer, SerializerError};

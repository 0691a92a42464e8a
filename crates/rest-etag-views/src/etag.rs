//! ETag policy
//!
//! Entity tags are SHA-1 fingerprints of a canonical JSON rendering of the
//! resource representation. The canonical form sorts object keys at every
//! level, separates items with `", "` and keys from values with `": "`, and
//! escapes everything outside printable ASCII as `\uXXXX`, so the same
//! representation always yields the same tag regardless of field order.
//!
//! [`EtagPolicy`] applies the tags to a request:
//!
//! - before a mutating request (`PUT`, `PATCH`, `DELETE`) the current item is
//!   checked against `If-Match` ([`EtagPolicy::validate_precondition`])
//! - after the endpoint ran, the returned item is checked against
//!   `If-None-Match` on reads and its tag is set on the response
//!   ([`EtagPolicy::annotate_response`])

use hyper::Method;
use rest_etag_conf::Settings;
use rest_etag_core::exception::{Error, Result};
use rest_etag_core::serializers::Serializer;
use rest_etag_http::{EntityTag, EntityTagList, Response};
use serde::Serialize;
use serde_json::Value;
use sha1::{Digest, Sha1};
use std::io;

/// JSON formatter producing the canonical text that gets fingerprinted
struct CanonicalFormatter;

impl serde_json::ser::Formatter for CanonicalFormatter {
	fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
	where
		W: ?Sized + io::Write,
	{
		if first {
			Ok(())
		} else {
			writer.write_all(b", ")
		}
	}

	fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
	where
		W: ?Sized + io::Write,
	{
		if first {
			Ok(())
		} else {
			writer.write_all(b", ")
		}
	}

	fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
	where
		W: ?Sized + io::Write,
	{
		writer.write_all(b": ")
	}

	fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
	where
		W: ?Sized + io::Write,
	{
		let mut start = 0;
		for (i, ch) in fragment.char_indices() {
			if ch.is_ascii() && ch != '\u{7f}' {
				continue;
			}
			writer.write_all(&fragment.as_bytes()[start..i])?;
			let mut units = [0u16; 2];
			for unit in ch.encode_utf16(&mut units) {
				write!(writer, "\\u{:04x}", unit)?;
			}
			start = i + ch.len_utf8();
		}
		writer.write_all(&fragment.as_bytes()[start..])
	}

	// Shortest round-trip digits, laid out as `1e+16`, `1e-05`, `0.0001` or
	// `100.0`. Exponent form once four zeros would follow the point or the
	// integer part would exceed sixteen digits.
	fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
	where
		W: ?Sized + io::Write,
	{
		let sci = format!("{:e}", value);
		let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
		let exp: i32 = exp
			.parse()
			.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
		let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
		let sign = if mantissa.starts_with('-') { "-" } else { "" };
		let point = exp + 1;
		let count = digits.len() as i32;

		if point <= -4 || point > 16 {
			let (lead, rest) = digits.split_at(1);
			let fraction = if rest.is_empty() { String::new() } else { format!(".{}", rest) };
			let exp_sign = if exp < 0 { '-' } else { '+' };
			write!(writer, "{sign}{lead}{fraction}e{exp_sign}{:02}", exp.abs())
		} else if point <= 0 {
			write!(writer, "{sign}0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
		} else if point < count {
			let (whole, fraction) = digits.split_at(point as usize);
			write!(writer, "{sign}{whole}.{fraction}")
		} else {
			write!(writer, "{sign}{digits}{}.0", "0".repeat((point - count) as usize))
		}
	}
}

/// Serializes a value with object keys in code point order
struct Sorted<'a>(&'a Value);

impl Serialize for Sorted<'_> {
	fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		match self.0 {
			Value::Array(items) => serializer.collect_seq(items.iter().map(Sorted)),
			Value::Object(map) => {
				let mut entries: Vec<(&String, &Value)> = map.iter().collect();
				entries.sort_by(|a, b| a.0.cmp(b.0));
				serializer.collect_map(entries.into_iter().map(|(k, v)| (k, Sorted(v))))
			}
			other => other.serialize(serializer),
		}
	}
}

/// Render a value in canonical form
///
/// # Examples
///
/// ```
/// use rest_etag_views::canonical_json;
/// use serde_json::json;
///
/// let text = canonical_json(&json!({"b": [true, null], "a": 1})).unwrap();
/// assert_eq!(text, r#"{"a": 1, "b": [true, null]}"#);
///
/// let text = canonical_json(&json!("café")).unwrap();
/// assert_eq!(text, r#""caf\u00e9""#);
/// ```
pub fn canonical_json(value: &Value) -> Result<String> {
	let mut buf = Vec::with_capacity(128);
	let mut serializer = serde_json::Serializer::with_formatter(&mut buf, CanonicalFormatter);
	Sorted(value).serialize(&mut serializer)?;
	String::from_utf8(buf).map_err(|e| Error::Serialization(e.to_string()))
}

/// Compute the fingerprint of any serializable data
///
/// Returns the lowercase hex SHA-1 digest of the canonical JSON rendering.
///
/// # Errors
///
/// Returns [`Error::Serialization`] when `data` has no JSON representation
/// (e.g. a map with non-string keys).
///
/// # Examples
///
/// ```
/// use rest_etag_views::compute_fingerprint;
/// use serde_json::json;
///
/// let a = compute_fingerprint(&json!({"id": 1, "name": "Rex"})).unwrap();
/// let b = compute_fingerprint(&json!({"name": "Rex", "id": 1})).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 40);
/// ```
pub fn compute_fingerprint<T: Serialize + ?Sized>(data: &T) -> Result<String> {
	let value = serde_json::to_value(data)?;
	let canonical = canonical_json(&value)?;
	Ok(hex::encode(Sha1::digest(canonical.as_bytes())))
}

/// Fingerprint an item as rendered through `schema`
pub fn fingerprint_item<S>(schema: &S, item: &S::Input) -> Result<String>
where
	S: Serializer<Output = Value> + ?Sized,
{
	let representation = schema.serialize(item)?;
	compute_fingerprint(&representation)
}

fn is_mutating(method: &Method) -> bool {
	matches!(*method, Method::PUT | Method::PATCH | Method::DELETE)
}

fn is_read(method: &Method) -> bool {
	matches!(*method, Method::GET | Method::HEAD)
}

/// Applies entity tags to requests and responses
///
/// A disabled policy turns every operation into a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EtagPolicy {
	enabled: bool,
}

impl EtagPolicy {
	pub const fn new(enabled: bool) -> Self {
		Self { enabled }
	}

	/// Policy following the `ETAG_ENABLED` setting
	pub fn from_settings(settings: &Settings) -> Self {
		Self::new(settings.etag_enabled)
	}

	pub fn is_enabled(&self) -> bool {
		self.enabled
	}

	/// True when `method` must be guarded by `If-Match`
	pub fn requires_precondition(&self, method: &Method) -> bool {
		self.enabled && is_mutating(method)
	}

	/// Check `If-Match` against the current state of the resource
	///
	/// Only applies to `PUT`, `PATCH` and `DELETE`. `If-Match: *` accepts
	/// any current representation; otherwise the list must contain the
	/// item's fingerprint as a strong tag.
	///
	/// # Errors
	///
	/// - [`Error::PreconditionRequired`] when no `If-Match` value was sent
	/// - [`Error::PreconditionFailed`] when none of the tags match
	///
	/// # Examples
	///
	/// ```
	/// use hyper::Method;
	/// use rest_etag_core::exception::Error;
	/// use rest_etag_core::serializers::JsonSerializer;
	/// use rest_etag_http::EntityTagList;
	/// use rest_etag_views::EtagPolicy;
	/// use serde_json::{Value, json};
	///
	/// let policy = EtagPolicy::new(true);
	/// let schema = JsonSerializer::<Value>::new();
	/// let item = json!({"id": 1});
	///
	/// let err = policy
	///     .validate_precondition(&Method::PUT, &schema, &item, &EntityTagList::default())
	///     .unwrap_err();
	/// assert!(matches!(err, Error::PreconditionRequired));
	///
	/// assert!(policy
	///     .validate_precondition(&Method::PUT, &schema, &item, &EntityTagList::any())
	///     .is_ok());
	/// ```
	pub fn validate_precondition<S>(
		&self,
		method: &Method,
		schema: &S,
		item: &S::Input,
		if_match: &EntityTagList,
	) -> Result<()>
	where
		S: Serializer<Output = Value> + ?Sized,
	{
		if !self.requires_precondition(method) {
			return Ok(());
		}

		if if_match.is_empty() {
			tracing::warn!(method = %method, "rejecting request without If-Match");
			return Err(Error::PreconditionRequired);
		}
		if if_match.is_any() {
			return Ok(());
		}

		let etag = fingerprint_item(schema, item)?;
		if !if_match.contains(&etag) {
			tracing::warn!(method = %method, etag = %etag, "If-Match does not include current entity tag");
			return Err(Error::PreconditionFailed);
		}

		tracing::debug!(method = %method, etag = %etag, "precondition satisfied");
		Ok(())
	}

	/// Tag the response with the fingerprint of `item`
	///
	/// Skipped for `DELETE` and when there is no item. On `GET` and `HEAD` a
	/// fingerprint listed in `If-None-Match` aborts with [`Error::NotModified`]
	/// instead.
	///
	/// `If-None-Match` is compared weakly, so `W/"<tag>"` also counts as a
	/// match, and `HEAD` gets the same 304 as `GET` (RFC 7232, sections 3.2
	/// and 4.1). Earlier releases compared strongly and only answered `GET`
	/// with 304; clients that relied on a weak tag or `HEAD` still receiving
	/// 200 will now see 304.
	///
	/// # Errors
	///
	/// - [`Error::NotModified`] carrying the current tag
	/// - [`Error::Serialization`] when the item cannot be rendered
	pub fn annotate_response<S>(
		&self,
		method: &Method,
		if_none_match: &EntityTagList,
		response: &mut Response,
		schema: &S,
		item: Option<&S::Input>,
	) -> Result<()>
	where
		S: Serializer<Output = Value> + ?Sized,
	{
		if !self.enabled || *method == Method::DELETE {
			return Ok(());
		}
		let Some(item) = item else {
			return Ok(());
		};

		let etag = fingerprint_item(schema, item)?;
		if is_read(method) && if_none_match.contains_weak(&etag) {
			tracing::debug!(method = %method, etag = %etag, "representation not modified");
			return Err(Error::NotModified { etag });
		}

		tracing::debug!(method = %method, etag = %etag, "setting entity tag");
		response.set_etag(&EntityTag::strong(etag))
	}
}

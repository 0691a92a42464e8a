//! Entity tags and entity-tag lists.
//!
//! Parsing is lenient: quoted, weak (`W/` or `w/`) and bare tags are all
//! accepted, and a `*` anywhere in the list turns it into a wildcard.

use hyper::HeaderMap;
use hyper::header::HeaderName;
use std::fmt;

/// A single entity tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityTag {
	tag: String,
	weak: bool,
}

impl EntityTag {
	/// Create a strong entity tag
	pub fn strong(tag: impl Into<String>) -> Self {
		Self {
			tag: tag.into(),
			weak: false,
		}
	}

	/// Create a weak entity tag
	pub fn weak(tag: impl Into<String>) -> Self {
		Self {
			tag: tag.into(),
			weak: true,
		}
	}

	/// Strong comparison: both tags strong and equal
	pub fn strong_eq(&self, other: &EntityTag) -> bool {
		!self.weak && !other.weak && self.tag == other.tag
	}

	/// Weak comparison: tags equal regardless of weakness
	pub fn weak_eq(&self, other: &EntityTag) -> bool {
		self.tag == other.tag
	}
}

impl fmt::Display for EntityTag {
	/// Formats the tag as it appears in an `ETag` header
	///
	/// # Examples
	///
	/// ```
	/// use rest_etag_http::EntityTag;
	///
	/// assert_eq!(EntityTag::strong("abc").to_string(), "\"abc\"");
	/// assert_eq!(EntityTag::weak("abc").to_string(), "W/\"abc\"");
	/// ```
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.weak {
			write!(f, "W/\"{}\"", self.tag)
		} else {
			write!(f, "\"{}\"", self.tag)
		}
	}
}

/// Parsed `If-Match` / `If-None-Match` value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityTagList {
	tags: Vec<EntityTag>,
	any: bool,
}

impl EntityTagList {
	/// The `*` wildcard list
	pub fn any() -> Self {
		Self {
			tags: Vec::new(),
			any: true,
		}
	}

	/// Parse a single header value
	///
	/// # Examples
	///
	/// ```
	/// use rest_etag_http::EntityTagList;
	///
	/// let list = EntityTagList::parse("\"a\", W/\"b\", c");
	/// assert_eq!(list.len(), 3);
	/// assert!(list.contains("a"));
	/// assert!(list.contains("c"));
	/// assert!(list.contains_weak("b"));
	///
	/// assert!(EntityTagList::parse("*").is_any());
	/// assert!(EntityTagList::parse("  ").is_empty());
	/// ```
	pub fn parse(value: &str) -> Self {
		let mut list = Self::default();
		list.extend_from_str(value);
		list
	}

	/// Collect every occurrence of `name` in `headers` into one list
	pub fn from_headers(headers: &HeaderMap, name: &HeaderName) -> Self {
		let mut list = Self::default();
		for value in headers.get_all(name) {
			match value.to_str() {
				Ok(s) => list.extend_from_str(s),
				Err(_) => tracing::debug!(header = %name, "ignoring non-ASCII entity tag header"),
			}
		}
		list
	}

	fn extend_from_str(&mut self, value: &str) {
		let bytes = value.as_bytes();
		let mut pos = 0;

		while pos < bytes.len() {
			// separators and surrounding whitespace
			while pos < bytes.len() && (bytes[pos] == b',' || bytes[pos].is_ascii_whitespace()) {
				pos += 1;
			}
			if pos >= bytes.len() {
				break;
			}

			let weak = bytes[pos..].starts_with(b"W/") || bytes[pos..].starts_with(b"w/");
			if weak {
				pos += 2;
			}

			let (raw, quoted, next) = if bytes.get(pos) == Some(&b'"') {
				let start = pos + 1;
				match value[start..].find('"') {
					Some(len) => (&value[start..start + len], true, start + len + 1),
					None => (&value[start..], true, bytes.len()),
				}
			} else {
				let end = value[pos..].find(',').map_or(bytes.len(), |i| pos + i);
				(value[pos..end].trim(), false, end)
			};
			pos = next;

			if !quoted && raw == "*" {
				self.any = true;
				continue;
			}
			if !quoted && raw.is_empty() {
				continue;
			}

			self.tags.push(EntityTag {
				tag: raw.to_string(),
				weak,
			});
		}
	}

	/// True when neither tags nor the wildcard were supplied
	pub fn is_empty(&self) -> bool {
		self.tags.is_empty() && !self.any
	}

	/// True when the list is (or contains) the `*` wildcard
	pub fn is_any(&self) -> bool {
		self.any
	}

	pub fn len(&self) -> usize {
		self.tags.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = &EntityTag> {
		self.tags.iter()
	}

	/// Strong membership test used for `If-Match`
	///
	/// Weak tags in the list never match.
	pub fn contains(&self, tag: &str) -> bool {
		let candidate = EntityTag::strong(tag);
		self.any || self.tags.iter().any(|t| t.strong_eq(&candidate))
	}

	/// Weak membership test used for `If-None-Match`
	pub fn contains_weak(&self, tag: &str) -> bool {
		let candidate = EntityTag::strong(tag);
		self.any || self.tags.iter().any(|t| t.weak_eq(&candidate))
	}
}

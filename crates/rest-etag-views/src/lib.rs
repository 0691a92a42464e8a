//! # rest-etag-views
//!
//! Conditional request execution using the `If-Match` and `If-None-Match`
//! headers.
//!
//! - [`etag`] holds the policy: fingerprinting a representation and
//!   evaluating the conditional headers against it.
//! - [`view`] wires the policy into a request: [`ResourceView`] fetches the
//!   current item before a mutation, runs the endpoint, renders the result
//!   and tags the response.
//!
//! The whole feature is switched by the `ETAG_ENABLED` setting; when it is
//! off both call sites are no-ops.

pub mod etag;
pub mod view;

pub use etag::{EtagPolicy, canonical_json, compute_fingerprint, fingerprint_item};
pub use view::{Endpoint, GetItem, Rendered, ResourceView, ResourceViewBuilder, SharedSchema};

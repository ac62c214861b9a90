//! Result caching.
//!
//! `TtlCache` is a generic keyed cache whose entry lifetimes come from a
//! pluggable `VolatilityPolicy`. The service keeps traversal results in a
//! `ResultCache` keyed by the canonical request signature.

mod policy;
mod ttl_cache;

pub use policy::{MarkerPolicy, VolatilityPolicy};
pub use ttl_cache::TtlCache;

use crate::traversal::ConceptRef;

/// Traversal results by request signature.
pub type ResultCache = TtlCache<Vec<ConceptRef>>;

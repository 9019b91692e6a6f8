//! Bounded result cache with lazy TTL expiry and LRU eviction.
//!
//! Search outputs are stored under a [`CacheKey`], a SHA-256 fingerprint of
//! the canonical encoding of everything that can change a result set: the
//! normalized query text, the canonical filters and the result-affecting
//! search settings. The decoded [`KeyParts`] travel with each entry so that
//! callers can invalidate structurally (e.g. "every query filtering on
//! category X").
//!
//! The cache is advisory: every failure degrades to a miss.

mod error;
mod key;
mod store;

pub use error::{CacheError, CacheResult};
pub use key::{normalize_query_text, CacheKey, CanonicalFilters, KeyParts};
pub use store::{CacheEntry, CacheStats, ResultCache};

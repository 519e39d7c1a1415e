//! Engine defaults.
//!
//! Binaries expose most of these as CLI flags; the constants are what the
//! library falls back to when nothing else is configured.

/// Number of documents kept per term by [`crate::PostingsStore::update_champions`].
pub const DEFAULT_CHAMPION_R: usize = 20;

/// Tokens per shingle.
pub const DEFAULT_SHINGLE_SIZE: usize = 4;

/// Shingles grouped into one super-shingle.
pub const DEFAULT_SUPERSHINGLE_GROUP: usize = 6;

/// Upper bound on the number of shingles kept in a document sketch.
///
/// 84 shingles make 14 super-shingles of 6.
pub const DEFAULT_SKETCH_LIMIT: usize = 84;

/// Deepest nesting of parenthesized or `NOT`-opened sub-expressions a query
/// may use. Evaluation recurses once per level.
pub const MAX_QUERY_DEPTH: usize = 256;

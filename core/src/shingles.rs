//! Shingles and super-shingles for near-duplicate detection.
//!
//! A shingle is a window of `n` consecutive whitespace-separated tokens. A
//! super-shingle hashes a group of `k` shingles from a document's sketch;
//! two documents sharing super-shingles are likely near-duplicates.

use crate::error::ShingleError;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub type Shingle<'a> = Vec<&'a str>;

/// All `n`-token windows of `document`, in order.
///
/// A document of `T` tokens has `T - n + 1` shingles, or none when `n > T`.
pub fn shingles(document: &str, n: usize) -> Result<Vec<Shingle<'_>>, ShingleError> {
    if n == 0 {
        return Err(ShingleError::ZeroWidth);
    }
    let tokens: Vec<&str> = document.split_whitespace().collect();
    Ok(tokens.windows(n).map(<[&str]>::to_vec).collect())
}

/// Hash each non-overlapping group of `k` entries of `sketch`.
///
/// The sketch length must be a multiple of `k`; nothing is hashed otherwise.
pub fn supershingles<S, F>(sketch: &[S], hash: F, k: usize) -> Result<Vec<u64>, ShingleError>
where
    F: Fn(&[S]) -> u64,
{
    if k == 0 {
        return Err(ShingleError::ZeroGroup);
    }
    if sketch.len() % k != 0 {
        return Err(ShingleError::SizeMismatch { len: sketch.len(), k });
    }
    Ok(sketch.chunks_exact(k).map(hash).collect())
}

pub fn default_hash<S: Hash>(group: &[S]) -> u64 {
    let mut hasher = DefaultHasher::new();
    group.hash(&mut hasher);
    hasher.finish()
}

/// A deterministic sample of a document's shingles, sized for
/// [`supershingles`].
///
/// Shingles are ordered by hash (min-hash style, so similar documents pick
/// similar samples) and cut to the largest multiple of `k` that is at most
/// `limit`.
pub fn sketch<'a>(mut shingles: Vec<Shingle<'a>>, k: usize, limit: usize) -> Result<Vec<Shingle<'a>>, ShingleError> {
    if k == 0 {
        return Err(ShingleError::ZeroGroup);
    }
    shingles.sort_by_cached_key(|s| (default_hash(s), s.clone()));
    shingles.dedup();
    let keep = shingles.len().min(limit) / k * k;
    shingles.truncate(keep);
    Ok(shingles)
}

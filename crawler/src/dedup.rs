use ir_core::config::{DEFAULT_SHINGLE_SIZE, DEFAULT_SKETCH_LIMIT, DEFAULT_SUPERSHINGLE_GROUP};
use ir_core::shingles::{shingles, sketch, supershingles, Shingle};
use ir_core::ShingleError;
use sha1::{Digest, Sha1};
use std::collections::HashSet;

/// Drops pages that share enough super-shingles with a page kept earlier.
///
/// Pages too short to fill one super-shingle have no fingerprint and are
/// never treated as duplicates.
pub struct NearDuplicateFilter {
    seen: HashSet<u64>,
    threshold: usize,
    shingle_size: usize,
    group: usize,
    sketch_limit: usize,
}

impl NearDuplicateFilter {
    pub fn new(threshold: usize) -> Self {
        Self {
            seen: HashSet::new(),
            threshold: threshold.max(1),
            shingle_size: DEFAULT_SHINGLE_SIZE,
            group: DEFAULT_SUPERSHINGLE_GROUP,
            sketch_limit: DEFAULT_SKETCH_LIMIT,
        }
    }

    pub fn fingerprint(&self, text: &str) -> Result<Vec<u64>, ShingleError> {
        let all = shingles(text, self.shingle_size)?;
        let sample = sketch(all, self.group, self.sketch_limit)?;
        supershingles(&sample, sha1_hash, self.group)
    }

    /// Returns `true` for a near-duplicate. Other pages are remembered.
    pub fn check_and_insert(&mut self, text: &str) -> Result<bool, ShingleError> {
        let fingerprint = self.fingerprint(text)?;
        let shared = fingerprint.iter().filter(|h| self.seen.contains(h)).count();
        if !fingerprint.is_empty() && shared >= self.threshold.min(fingerprint.len()) {
            return Ok(true);
        }
        self.seen.extend(fingerprint);
        Ok(false)
    }
}

/// First 8 bytes of the SHA-1 of a group of shingles.
fn sha1_hash(group: &[Shingle<'_>]) -> u64 {
    let mut hasher = Sha1::new();
    for shingle in group {
        for token in shingle {
            hasher.update(token.as_bytes());
            hasher.update(b"\x1f");
        }
        hasher.update(b"\x1e");
    }
    let digest = hasher.finalize();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(words: usize, salt: &str) -> String {
        (0..words).map(|i| format!("w{i}{salt}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn identical_pages_are_duplicates() {
        let mut f = NearDuplicateFilter::new(2);
        let text = page(200, "");
        assert_eq!(f.check_and_insert(&text), Ok(false));
        assert_eq!(f.check_and_insert(&text), Ok(true));
    }

    #[test]
    fn unrelated_pages_are_kept() {
        let mut f = NearDuplicateFilter::new(1);
        assert_eq!(f.check_and_insert(&page(200, "a")), Ok(false));
        assert_eq!(f.check_and_insert(&page(200, "b")), Ok(false));
    }

    #[test]
    fn short_pages_have_no_fingerprint() {
        let mut f = NearDuplicateFilter::new(1);
        assert!(f.fingerprint("only a few words here").unwrap().is_empty());
        assert_eq!(f.check_and_insert("only a few words here"), Ok(false));
        assert_eq!(f.check_and_insert("only a few words here"), Ok(false));
    }

    #[test]
    fn fingerprint_is_a_super_shingle_per_group() {
        let f = NearDuplicateFilter::new(1);
        // 200 words give 197 shingles; the sketch keeps 84, i.e. 14 groups.
        assert_eq!(f.fingerprint(&page(200, "")).unwrap().len(), 14);
        // 30 words give 27 shingles, cut to 24: 4 groups.
        assert_eq!(f.fingerprint(&page(30, "")).unwrap().len(), 4);
    }
}

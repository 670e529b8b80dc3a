//! Short identifier tracking during sequence import

use std::collections::HashSet;

/// Identifier prefix up to the first whitespace or control byte.
pub fn short_id(id: &str) -> &str {
    let end = id.bytes().position(|b| b <= b' ').unwrap_or(id.len());
    // Bytes <= 32 are ASCII, so `end` is always a char boundary.
    &id[..end]
}

/// Remembers the short identifiers seen so far in one import pass.
#[derive(Debug, Default)]
pub struct IdDeduplicator {
    seen: HashSet<String>,
    duplicates: usize,
}

impl IdDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id`; returns `false` if its short form was already seen.
    pub fn observe(&mut self, id: &str) -> bool {
        let short = short_id(id);
        if self.seen.contains(short) {
            self.duplicates += 1;
            false
        } else {
            self.seen.insert(short.to_string());
            true
        }
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn all_unique(&self) -> bool {
        self.duplicates == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_truncation() {
        assert_eq!(short_id("seq1 extra words"), "seq1");
        assert_eq!(short_id("seq1\tx"), "seq1");
        assert_eq!(short_id("seq1"), "seq1");
        assert_eq!(short_id(" leading"), "");
    }

    #[test]
    fn test_same_prefix_collides() {
        let mut dedup = IdDeduplicator::new();
        assert!(dedup.observe("seq1 extra"));
        assert!(!dedup.observe("seq1 other"));
        assert!(!dedup.all_unique());
        assert_eq!(dedup.duplicates(), 1);
    }

    #[test]
    fn test_distinct_ids_are_unique() {
        let mut dedup = IdDeduplicator::new();
        assert!(dedup.observe("seq1"));
        assert!(dedup.observe("seq2"));
        assert!(dedup.all_unique());
    }
}

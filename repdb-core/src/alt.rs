//! Variant (ALT) store interface
//!
//! The query engine only needs the variants in position order; a variant's
//! index in that order is its snp id.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::types::SnpId;

/// A single variant in repeat-sequence space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alt {
    /// Position the variant is sorted by
    pub pos: u64,
    /// Leftmost base affected by the variant
    pub left: u64,
}

impl Alt {
    pub fn new(pos: u64, left: u64) -> Self {
        Self { pos, left }
    }
}

/// Read access to variants sorted ascending by position.
pub trait AltSource {
    fn alts(&self) -> &[Alt];
}

/// In-memory variant store.
#[derive(Debug, Clone, Default)]
pub struct AltDb {
    alts: Vec<Alt>,
}

impl AltDb {
    pub fn new(mut alts: Vec<Alt>) -> Self {
        alts.sort_by_key(|a| (a.pos, a.left));
        Self { alts }
    }

    pub fn len(&self) -> usize {
        self.alts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alts.is_empty()
    }
}

impl AltSource for AltDb {
    fn alts(&self) -> &[Alt] {
        &self.alts
    }
}

impl AltSource for [Alt] {
    fn alts(&self) -> &[Alt] {
        self
    }
}

impl AltSource for Vec<Alt> {
    fn alts(&self) -> &[Alt] {
        self
    }
}

/// Half-open range of snp ids relevant to the interval `[left, right]`:
/// starts at the first variant with `pos >= left` and extends while the
/// variant's left extent does not pass `right`.
pub fn variant_window<S: AltSource + ?Sized>(store: &S, left: u64, right: u64) -> Range<SnpId> {
    let alts = store.alts();
    let start = alts.partition_point(|a| a.pos < left);
    let len = alts[start..]
        .iter()
        .take_while(|a| a.left <= right)
        .count();
    start as SnpId..(start + len) as SnpId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alt_db_sorts_on_construction() {
        let db = AltDb::new(vec![Alt::new(30, 30), Alt::new(10, 8), Alt::new(20, 20)]);
        let positions: Vec<u64> = db.alts().iter().map(|a| a.pos).collect();
        assert_eq!(positions, vec![10, 20, 30]);
        assert_eq!(db.len(), 3);
    }

    #[test]
    fn test_variant_window() {
        let alts = vec![
            Alt::new(5, 5),
            Alt::new(12, 10),
            Alt::new(18, 18),
            Alt::new(25, 21),
            Alt::new(40, 40),
        ];
        assert_eq!(variant_window(&alts, 10, 20), 1..3);
        assert_eq!(variant_window(&alts, 10, 21), 1..4);
        assert_eq!(variant_window(&alts, 0, 4), 0..0);
        assert_eq!(variant_window(&alts, 41, 100), 5..5);
    }

    #[test]
    fn test_variant_window_empty_store() {
        let db = AltDb::default();
        assert_eq!(variant_window(&db, 0, 1000), 0..0);
    }
}

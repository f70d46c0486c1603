//! Repeat masking
//!
//! Marks joined-text regions covered by accepted repeat groups so that a
//! non-repeat view of the genome can exclude them.

use bitvec::prelude::*;

use crate::types::JoinedPos;

/// One bit per joined base; set bits are covered by a repeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatMask {
    bits: BitVec<u64, Lsb0>,
}

impl RepeatMask {
    pub fn new(joined_len: usize) -> Self {
        Self {
            bits: bitvec![u64, Lsb0; 0; joined_len],
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Mark `[start, start + len)`, clamped to the mask length.
    /// Returns the number of newly masked bases.
    pub fn mark(&mut self, start: JoinedPos, len: u64) -> usize {
        let (start, end) = self.clamp(start, len);
        let region = &mut self.bits[start..end];
        let before = region.count_ones();
        region.fill(true);
        (end - start) - before
    }

    pub fn is_masked(&self, pos: JoinedPos) -> bool {
        self.bits
            .get(pos as usize)
            .map(|bit| *bit)
            .unwrap_or(false)
    }

    pub fn masked_len(&self) -> usize {
        self.bits.count_ones()
    }

    /// Replace masked bases of `text` with `N`.
    pub fn apply(&self, text: &mut [u8]) -> usize {
        let mut masked = 0;
        for idx in self.bits.iter_ones() {
            if let Some(base) = text.get_mut(idx) {
                if *base != b'N' {
                    *base = b'N';
                    masked += 1;
                }
            }
        }
        masked
    }

    /// Maximal unmasked half-open ranges in ascending order.
    pub fn unmasked_ranges(&self) -> Vec<(JoinedPos, JoinedPos)> {
        let mut ranges = Vec::new();
        let mut start: Option<usize> = None;
        for (idx, bit) in self.bits.iter().by_vals().enumerate() {
            match (bit, start) {
                (false, None) => start = Some(idx),
                (true, Some(s)) => {
                    ranges.push((s as JoinedPos, idx as JoinedPos));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            ranges.push((s as JoinedPos, self.bits.len() as JoinedPos));
        }
        ranges
    }

    fn clamp(&self, start: JoinedPos, len: u64) -> (usize, usize) {
        let total = self.bits.len();
        let start = (start as usize).min(total);
        let end = (start as u64).saturating_add(len).min(total as u64) as usize;
        (start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_counts_new_bases_only() {
        let mut mask = RepeatMask::new(20);
        assert_eq!(mask.mark(2, 5), 5);
        assert_eq!(mask.mark(4, 5), 2);
        assert_eq!(mask.masked_len(), 7);
        assert!(mask.is_masked(2));
        assert!(mask.is_masked(8));
        assert!(!mask.is_masked(9));
        assert!(!mask.is_masked(100));
    }

    #[test]
    fn test_mark_clamps_to_length() {
        let mut mask = RepeatMask::new(10);
        assert_eq!(mask.mark(8, 50), 2);
        assert_eq!(mask.mark(30, 5), 0);
        assert!(mask.is_masked(9));
        assert!(!mask.is_masked(7));
    }

    #[test]
    fn test_apply_and_unmasked_ranges() {
        let mut mask = RepeatMask::new(10);
        mask.mark(0, 2);
        mask.mark(5, 2);
        let mut text = b"ACGTACGTAC".to_vec();
        assert_eq!(mask.apply(&mut text), 4);
        assert_eq!(&text, b"NNGTANNTAC");
        assert_eq!(mask.unmasked_ranges(), vec![(2, 5), (7, 10)]);
    }
}

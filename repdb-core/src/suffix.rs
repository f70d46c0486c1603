//! Suffix ordering helpers
//!
//! The builder consumes any sorted ordering of joined-text suffixes. A naive
//! comparison-sort construction is provided for small genomes and tests;
//! production inputs come from an external suffix-array builder.

use std::cmp::Ordering;

use crate::types::JoinedPos;

/// Build a suffix array over `text` by sorting suffix start offsets.
pub fn naive_suffix_array(text: &[u8]) -> Vec<JoinedPos> {
    let mut sa: Vec<usize> = (0..text.len()).collect();
    sa.sort_by(|&a, &b| compare_suffixes(text, a, b));
    sa.into_iter().map(|p| p as JoinedPos).collect()
}

fn compare_suffixes(text: &[u8], lhs: usize, rhs: usize) -> Ordering {
    text[lhs..].cmp(&text[rhs..])
}

/// Length of the common prefix of the suffixes starting at `a` and `b`,
/// not reading past `end_a` / `end_b` respectively.
pub fn common_prefix_len(
    text: &[u8],
    a: JoinedPos,
    b: JoinedPos,
    end_a: JoinedPos,
    end_b: JoinedPos,
) -> u64 {
    let len = text.len() as u64;
    let end_a = end_a.min(len);
    let end_b = end_b.min(len);
    if a >= end_a || b >= end_b {
        return 0;
    }

    let max = (end_a - a).min(end_b - b) as usize;
    let lhs = &text[a as usize..a as usize + max];
    let rhs = &text[b as usize..b as usize + max];
    lhs.iter().zip(rhs).take_while(|(x, y)| x == y).count() as u64
}

/// Check that `sa` is a permutation of `0..text.len()` sorted by suffix.
#[cfg(test)]
fn is_sorted_suffix_array(text: &[u8], sa: &[JoinedPos]) -> bool {
    if sa.len() != text.len() {
        return false;
    }
    let mut seen = vec![false; text.len()];
    for &p in sa {
        match seen.get_mut(p as usize) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    sa.windows(2)
        .all(|w| compare_suffixes(text, w[0] as usize, w[1] as usize) == Ordering::Less)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naive_suffix_array() {
        let sa = naive_suffix_array(b"BANANA");
        assert_eq!(sa, vec![5, 3, 1, 0, 4, 2]);
        assert!(is_sorted_suffix_array(b"BANANA", &sa));
    }

    #[test]
    fn test_common_prefix_len_respects_bounds() {
        let text = b"ACGTACGTAC";
        assert_eq!(common_prefix_len(text, 0, 4, 10, 10), 6);
        assert_eq!(common_prefix_len(text, 0, 4, 3, 10), 3);
        assert_eq!(common_prefix_len(text, 0, 1, 10, 10), 0);
        assert_eq!(common_prefix_len(text, 12, 0, 20, 10), 0);
    }

    #[test]
    fn test_rejects_unsorted_ordering() {
        assert!(!is_sorted_suffix_array(b"ACG", &[2, 1, 0]));
        assert!(!is_sorted_suffix_array(b"ACG", &[0, 0, 1]));
    }
}

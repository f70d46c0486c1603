use serde::{Deserialize, Serialize};

/// Offset in the joined multi-sequence coordinate space.
pub type JoinedPos = u64;

/// Index of a variant in the ALT store.
pub type SnpId = u64;

/// A genomic position of one repeat occurrence.
///
/// Only `joined_off` and `fw` are persisted; `tid` and `toff` are zero until
/// the owning database has been resolved against a segment table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RepeatCoord {
    /// Sequence (chromosome) id
    pub tid: u64,
    /// Offset within the sequence
    pub toff: u64,
    /// Offset within the joined text
    pub joined_off: JoinedPos,
    /// Forward strand flag
    pub fw: bool,
}

impl RepeatCoord {
    /// Unresolved coordinate carrying only the joined offset and strand.
    pub fn joined(joined_off: JoinedPos, fw: bool) -> Self {
        Self {
            tid: 0,
            toff: 0,
            joined_off,
            fw,
        }
    }

    pub fn strand(&self) -> Strand {
        Strand::from(self.fw)
    }

    /// Copy of this coordinate shifted by `delta` in both joined and
    /// sequence-local space, saturating at `u64::MAX`.
    pub fn shifted(&self, delta: u64) -> Self {
        Self {
            toff: self.toff.saturating_add(delta),
            joined_off: self.joined_off.saturating_add(delta),
            ..*self
        }
    }
}

/// One row of the segment table handed to `RepeatDb::construct`.
///
/// Rows are ascending by `joined_start`; a row covers joined offsets up to
/// (excluding) the next row's start, the last row is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub joined_start: JoinedPos,
    pub seq_id: u64,
    pub seq_start: u64,
}

impl Segment {
    pub fn new(joined_start: JoinedPos, seq_id: u64, seq_start: u64) -> Self {
        Self {
            joined_start,
            seq_id,
            seq_start,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    Forward,
    Reverse,
}

impl From<bool> for Strand {
    fn from(forward: bool) -> Self {
        if forward {
            Strand::Forward
        } else {
            Strand::Reverse
        }
    }
}

impl From<Strand> for bool {
    fn from(strand: Strand) -> Self {
        matches!(strand, Strand::Forward)
    }
}

impl From<Strand> for char {
    fn from(strand: Strand) -> Self {
        match strand {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shifted_keeps_tid_and_strand() {
        let coord = RepeatCoord {
            tid: 3,
            toff: 100,
            joined_off: 1100,
            fw: false,
        };
        let moved = coord.shifted(7);
        assert_eq!(moved.tid, 3);
        assert_eq!(moved.toff, 107);
        assert_eq!(moved.joined_off, 1107);
        assert_eq!(moved.strand(), Strand::Reverse);
    }

    #[test]
    fn test_strand_conversions() {
        assert_eq!(Strand::from(true), Strand::Forward);
        assert!(bool::from(Strand::Forward));
        assert_eq!(char::from(Strand::Reverse), '-');
    }
}

//! Repeat families, alleles and the repeat database
//!
//! A [`RepeatDb`] is what the builder produces and what the store reads back:
//! families with joined offsets only. [`RepeatDb::construct`] consumes it,
//! resolves every occurrence to a sequence id and local offset and builds the
//! position-to-family lookup table, giving an immutable [`ResolvedRepeatDb`]
//! that serves queries through shared references.

use std::cmp::Ordering;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{JoinedPos, RepeatCoord, Segment, SnpId};

/// Errors raised when a repeat database violates its structural invariants
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepeatError {
    #[error("Segment table is empty but {positions} positions need placing")]
    EmptySegmentTable { positions: usize },

    #[error("Segment table is not ascending at row {index}")]
    UnsortedSegments { index: usize },

    #[error("Joined offset {joined_off} lies before the first segment")]
    UnplacedPosition { joined_off: JoinedPos },

    #[error("Family {index} ends before the family preceding it")]
    UnsortedFamilies { index: usize },

    #[error("Positions of allele {allele} in family {repeat} are not ascending")]
    UnsortedPositions { repeat: usize, allele: usize },

    #[error("SNP ids of allele {allele_id} are not strictly ascending")]
    UnsortedSnpIds { allele_id: u64 },

    #[error("Repeat offset {offset} is past the end of the repeat sequence ({len})")]
    FamilyOutOfRange { offset: u64, len: u64 },

    #[error("Family {index} extends past the largest representable offset")]
    FamilyOverflow { index: usize },

    #[error("Sequence offset of joined offset {joined_off} is not representable")]
    CoordinateOverflow { joined_off: JoinedPos },
}

pub type RepeatResult<T> = Result<T, RepeatError>;

/// One variant-specific form of a repeat family and its occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RepeatAllele {
    pub allele_id: u64,
    /// Strictly ascending ids of the variants carried by this allele
    pub snp_ids: Vec<SnpId>,
    pub positions: Vec<RepeatCoord>,
}

impl RepeatAllele {
    pub fn new(
        allele_id: u64,
        snp_ids: Vec<SnpId>,
        positions: Vec<RepeatCoord>,
    ) -> RepeatResult<Self> {
        if !snp_ids.windows(2).all(|w| w[0] < w[1]) {
            return Err(RepeatError::UnsortedSnpIds { allele_id });
        }
        Ok(Self {
            allele_id,
            snp_ids,
            positions,
        })
    }

    /// Allele carrying no variants.
    pub fn without_variants(allele_id: u64, positions: Vec<RepeatCoord>) -> Self {
        Self {
            allele_id,
            snp_ids: Vec::new(),
            positions,
        }
    }

    /// Whether this allele carries exactly `query` among the variant ids in
    /// `window`. Ids outside the window are ignored.
    pub fn compatible(&self, query: &[SnpId], window: &Range<SnpId>) -> bool {
        if self.snp_ids.len() < query.len() {
            return false;
        }

        let start = self
            .snp_ids
            .iter()
            .position(|&id| id >= window.start)
            .unwrap_or(self.snp_ids.len());
        if self.snp_ids.len() - start < query.len() {
            return false;
        }

        let end = start + query.len();
        if self.snp_ids[start..end] != *query {
            return false;
        }

        match self.snp_ids.get(end) {
            Some(&next) => next >= window.end,
            None => true,
        }
    }

    /// Order by id, then number of variants, then variant ids.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.allele_id
            .cmp(&other.allele_id)
            .then_with(|| self.snp_ids.len().cmp(&other.snp_ids.len()))
            .then_with(|| self.snp_ids.cmp(&other.snp_ids))
    }

    pub fn is_sorted(&self) -> bool {
        self.positions
            .windows(2)
            .all(|w| w[0].joined_off <= w[1].joined_off)
    }
}

/// A repeat family, placed at `[pos, pos + len)` in repeat-sequence space.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Repeat {
    /// Not persisted
    pub name: String,
    pub id: u64,
    pub pos: u64,
    pub len: u64,
    pub alleles: Vec<RepeatAllele>,
}

impl Repeat {
    pub fn new(name: impl Into<String>, id: u64, pos: u64, len: u64) -> Self {
        Self {
            name: name.into(),
            id,
            pos,
            len,
            alleles: Vec::new(),
        }
    }

    /// Cumulative end of this family in repeat-sequence space, saturating at
    /// `u64::MAX`.
    pub fn end(&self) -> u64 {
        self.pos.saturating_add(self.len)
    }

    /// Cumulative end, or `None` when `pos + len` overflows.
    pub fn checked_end(&self) -> Option<u64> {
        self.pos.checked_add(self.len)
    }

    pub fn num_positions(&self) -> usize {
        self.alleles.iter().map(|a| a.positions.len()).sum()
    }

    pub fn sort_alleles(&mut self) {
        self.alleles.sort_by(|a, b| a.canonical_cmp(b));
    }
}

/// Repeat families whose occurrences are known only by joined offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepeatDb {
    repeats: Vec<Repeat>,
}

impl RepeatDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_repeats(repeats: Vec<Repeat>) -> Self {
        Self { repeats }
    }

    pub fn push(&mut self, repeat: Repeat) {
        self.repeats.push(repeat);
    }

    pub fn repeats(&self) -> &[Repeat] {
        &self.repeats
    }

    pub fn repeats_mut(&mut self) -> &mut [Repeat] {
        &mut self.repeats
    }

    pub fn len(&self) -> usize {
        self.repeats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repeats.is_empty()
    }

    pub fn num_positions(&self) -> usize {
        self.repeats.iter().map(|r| r.num_positions()).sum()
    }

    /// Resolve every occurrence against `segments` and build the lookup table.
    ///
    /// `segments` must be ascending by joined start; each row covers joined
    /// offsets up to the next row's start and the last row is unbounded.
    /// Families must be laid out in ascending order of their end.
    pub fn construct(self, segments: &[Segment]) -> RepeatResult<ResolvedRepeatDb> {
        let mut repeats = self.repeats;

        if let Some(index) = segments
            .windows(2)
            .position(|w| w[1].joined_start <= w[0].joined_start)
        {
            return Err(RepeatError::UnsortedSegments { index: index + 1 });
        }

        let repeat_map: Vec<(u64, usize)> = repeats
            .iter()
            .enumerate()
            .map(|(idx, r)| {
                r.checked_end()
                    .map(|end| (end, idx))
                    .ok_or(RepeatError::FamilyOverflow { index: idx })
            })
            .collect::<RepeatResult<_>>()?;
        if let Some(index) = repeat_map.windows(2).position(|w| w[1].0 < w[0].0) {
            return Err(RepeatError::UnsortedFamilies { index: index + 1 });
        }

        let mut flat: Vec<(JoinedPos, usize)> = repeats
            .iter()
            .flat_map(|r| r.alleles.iter())
            .flat_map(|a| a.positions.iter())
            .enumerate()
            .map(|(slot, p)| (p.joined_off, slot))
            .collect();
        flat.sort_unstable();

        let mut resolved = vec![(0u64, 0u64); flat.len()];
        let mut seg = 0usize;
        for &(off, slot) in &flat {
            while seg + 1 < segments.len() && off >= segments[seg + 1].joined_start {
                seg += 1;
            }
            let segment = segments.get(seg).ok_or(RepeatError::EmptySegmentTable {
                positions: flat.len(),
            })?;
            if off < segment.joined_start {
                return Err(RepeatError::UnplacedPosition { joined_off: off });
            }
            let toff = (off - segment.joined_start)
                .checked_add(segment.seq_start)
                .ok_or(RepeatError::CoordinateOverflow { joined_off: off })?;
            resolved[slot] = (segment.seq_id, toff);
        }

        let mut slots = resolved.into_iter();
        for (r_idx, repeat) in repeats.iter_mut().enumerate() {
            for (a_idx, allele) in repeat.alleles.iter_mut().enumerate() {
                for (pos, (tid, toff)) in allele.positions.iter_mut().zip(slots.by_ref()) {
                    pos.tid = tid;
                    pos.toff = toff;
                }
                if !allele.is_sorted() {
                    return Err(RepeatError::UnsortedPositions {
                        repeat: r_idx,
                        allele: a_idx,
                    });
                }
            }
        }

        log::debug!(
            "Resolved {} positions of {} families against {} segments",
            flat.len(),
            repeats.len(),
            segments.len()
        );

        Ok(ResolvedRepeatDb {
            repeats,
            repeat_map,
        })
    }
}

/// Repeat database with resolved coordinates and a family lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRepeatDb {
    repeats: Vec<Repeat>,
    /// (cumulative end, family index), ascending
    repeat_map: Vec<(u64, usize)>,
}

impl ResolvedRepeatDb {
    pub fn repeats(&self) -> &[Repeat] {
        &self.repeats
    }

    pub fn repeat_map(&self) -> &[(u64, usize)] {
        &self.repeat_map
    }

    pub fn len(&self) -> usize {
        self.repeats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repeats.is_empty()
    }

    pub fn num_positions(&self) -> usize {
        self.repeats.iter().map(|r| r.num_positions()).sum()
    }

    /// Total length of the repeat sequence.
    pub fn repeat_len(&self) -> u64 {
        self.repeat_map.last().map_or(0, |&(end, _)| end)
    }

    /// Family enclosing `offset` in repeat-sequence space, with the offset
    /// made local to that family.
    pub fn find_repeat(&self, offset: u64) -> RepeatResult<(&Repeat, u64)> {
        let idx = self.repeat_map.partition_point(|&(end, _)| end <= offset);
        let &(_, repeat_idx) = self
            .repeat_map
            .get(idx)
            .ok_or(RepeatError::FamilyOutOfRange {
                offset,
                len: self.repeat_len(),
            })?;
        let prev_end = if idx > 0 { self.repeat_map[idx - 1].0 } else { 0 };
        Ok((&self.repeats[repeat_idx], offset - prev_end))
    }

    /// Drop the resolved coordinates, e.g. to re-resolve against another
    /// segment table.
    pub fn into_unresolved(self) -> RepeatDb {
        let mut repeats = self.repeats;
        for pos in repeats
            .iter_mut()
            .flat_map(|r| r.alleles.iter_mut())
            .flat_map(|a| a.positions.iter_mut())
        {
            pos.tid = 0;
            pos.toff = 0;
        }
        RepeatDb { repeats }
    }
}

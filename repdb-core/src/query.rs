//! Common-coordinate queries
//!
//! Given two intervals in repeat-sequence space and the variants a read
//! carries in each, report the genomic occurrence pairs of the two families
//! that lie within a distance tolerance of each other.

use serde::{Deserialize, Serialize};

use crate::alt::{variant_window, AltSource};
use crate::repeat::{RepeatResult, ResolvedRepeatDb};
use crate::types::{RepeatCoord, SnpId};

/// Default maximum joined-offset distance between paired occurrences.
pub const DEFAULT_DISTANCE: u64 = 1000;

/// How alleles of the second family are selected while pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlleleIndexing {
    /// Every allele of the first family is paired with every allele of the
    /// second family.
    #[default]
    Independent,
    /// The second family's allele is chosen by the first family's allele
    /// index on every inner iteration. Reproduces indices written by older
    /// builds; pairs may be missed or repeated.
    LegacyOuterIndex,
}

/// Two query intervals with their variant contexts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonCoordQuery {
    pub left: u64,
    pub right: u64,
    pub snp_ids: Vec<SnpId>,
    pub left2: u64,
    pub right2: u64,
    pub snp_ids2: Vec<SnpId>,
    pub distance: u64,
    pub allele_indexing: AlleleIndexing,
}

impl CommonCoordQuery {
    pub fn new(left: u64, right: u64, left2: u64, right2: u64) -> Self {
        Self {
            left,
            right,
            snp_ids: Vec::new(),
            left2,
            right2,
            snp_ids2: Vec::new(),
            distance: DEFAULT_DISTANCE,
            allele_indexing: AlleleIndexing::default(),
        }
    }

    pub fn with_snp_ids(mut self, snp_ids: Vec<SnpId>, snp_ids2: Vec<SnpId>) -> Self {
        self.snp_ids = snp_ids;
        self.snp_ids2 = snp_ids2;
        self
    }

    pub fn with_distance(mut self, distance: u64) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_allele_indexing(mut self, allele_indexing: AlleleIndexing) -> Self {
        self.allele_indexing = allele_indexing;
        self
    }
}

/// Occurrence of the first interval paired with one of the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordPair {
    pub first: RepeatCoord,
    pub second: RepeatCoord,
}

impl ResolvedRepeatDb {
    /// Fill `out` with occurrence pairs for `query`; returns whether any pair
    /// was found. `out` is cleared first.
    pub fn find_common_coords<S: AltSource + ?Sized>(
        &self,
        query: &CommonCoordQuery,
        alts: &S,
        out: &mut Vec<CoordPair>,
    ) -> RepeatResult<bool> {
        out.clear();

        let (repeat, adj_left) = self.find_repeat(query.left)?;
        let window = variant_window(alts, query.left, query.right);
        let (repeat2, adj_left2) = self.find_repeat(query.left2)?;
        let window2 = variant_window(alts, query.left2, query.right2);

        for (a, allele) in repeat.alleles.iter().enumerate() {
            if !allele.compatible(&query.snp_ids, &window) {
                continue;
            }
            for a2 in 0..repeat2.alleles.len() {
                let idx = match query.allele_indexing {
                    AlleleIndexing::Independent => a2,
                    AlleleIndexing::LegacyOuterIndex => a,
                };
                let Some(allele2) = repeat2.alleles.get(idx) else {
                    continue;
                };
                if !allele2.compatible(&query.snp_ids2, &window2) {
                    continue;
                }
                pair_positions(
                    &allele.positions,
                    &allele2.positions,
                    query.distance,
                    (adj_left, adj_left2),
                    out,
                );
            }
        }

        log::debug!(
            "Found {} common coordinates for [{}, {}] and [{}, {}]",
            out.len(),
            query.left,
            query.right,
            query.left2,
            query.right2
        );
        Ok(!out.is_empty())
    }
}

/// Single ascending walk over two sorted position lists. At each step the
/// front that is not behind is checked against the other within `distance`
/// and the lagging side advances.
fn pair_positions(
    positions: &[RepeatCoord],
    positions2: &[RepeatCoord],
    distance: u64,
    (adj, adj2): (u64, u64),
    out: &mut Vec<CoordPair>,
) {
    let (mut i, mut j) = (0, 0);
    while i < positions.len() && j < positions2.len() {
        let i_pos = positions[i].joined_off;
        let j_pos = positions2[j].joined_off;
        let close = if i_pos <= j_pos {
            i_pos.saturating_add(distance) >= j_pos
        } else {
            i_pos <= j_pos.saturating_add(distance)
        };
        if close {
            out.push(CoordPair {
                first: positions[i].shifted(adj),
                second: positions2[j].shifted(adj2),
            });
        }
        if i_pos <= j_pos {
            i += 1;
        } else {
            j += 1;
        }
    }
}

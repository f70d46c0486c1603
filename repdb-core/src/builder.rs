//! Repeat group discovery
//!
//! Scans a sorted suffix ordering of the joined genome once. Adjacent suffixes
//! whose common prefix reaches the minimum repeat length form runs; runs with
//! enough occurrences become candidate repeat groups. Candidates are then
//! optionally merged under a caller-supplied policy, masked, ordered and
//! converted into a [`RepeatDb`].

use std::io::Write;

use thiserror::Error;

use crate::fragments::{FragmentTable, JoinedTranslator};
use crate::mask::RepeatMask;
use crate::repeat::{Repeat, RepeatAllele, RepeatDb};
use crate::store::{self, StoreError, StoreOptions};
use crate::suffix::common_prefix_len;
use crate::types::{JoinedPos, RepeatCoord};

/// Line width of the repeat sequence FASTA output
pub const OUTPUT_WIDTH: usize = 60;

/// Errors that can occur while building repeat groups
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Joined text has {text} bases but fragments cover {fragments}")]
    LengthMismatch { text: usize, fragments: u64 },

    #[error("Suffix offset {pos} is outside the joined text of length {len}")]
    SuffixOutOfRange { pos: JoinedPos, len: usize },
}

pub type BuildResult<T> = Result<T, BuildError>;

/// Parameters for repeat group discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildParams {
    /// Minimum common prefix length of a repeat
    pub min_repeat_len: u64,
    /// Minimum number of occurrences of a repeat
    pub min_repeat_count: usize,
    /// Merge near-identical groups
    pub grouping: bool,
    /// Edit tolerance handed to the merge policy
    pub max_edit: usize,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            min_repeat_len: 100,
            min_repeat_count: 5,
            grouping: false,
            max_edit: 10,
        }
    }
}

impl BuildParams {
    pub fn validate(&self) -> BuildResult<()> {
        if self.min_repeat_len == 0 {
            return Err(BuildError::InvalidParams(
                "minimum repeat length must be greater than zero".to_string(),
            ));
        }
        if self.min_repeat_count < 2 {
            return Err(BuildError::InvalidParams(format!(
                "minimum repeat count must be at least 2, got {}",
                self.min_repeat_count
            )));
        }
        Ok(())
    }
}

/// Decides whether two candidate repeat sequences belong to one group.
pub trait MergePolicy {
    fn should_merge(&self, representative: &[u8], candidate: &[u8], max_edit: usize) -> bool;

    /// Get the name/identifier of this policy
    fn name(&self) -> &'static str;
}

/// Only identical sequences are merged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMerge;

impl MergePolicy for ExactMerge {
    fn should_merge(&self, representative: &[u8], candidate: &[u8], _max_edit: usize) -> bool {
        representative == candidate
    }

    fn name(&self) -> &'static str {
        "exact"
    }
}

/// Merge when the Levenshtein distance is within the tolerance.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenshteinMerge;

impl MergePolicy for LevenshteinMerge {
    fn should_merge(&self, representative: &[u8], candidate: &[u8], max_edit: usize) -> bool {
        if representative.len().abs_diff(candidate.len()) > max_edit {
            return false;
        }
        bio::alignment::distance::levenshtein(representative, candidate) as usize <= max_edit
    }

    fn name(&self) -> &'static str {
        "levenshtein"
    }
}

/// Cluster of occurrences sharing a representative sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepeatGroup {
    pub seq: Vec<u8>,
    /// Joined offsets of the occurrences
    pub positions: Vec<JoinedPos>,
    /// Sequences merged into this group
    pub alt_seq: Vec<Vec<u8>>,
}

impl RepeatGroup {
    pub fn new(seq: Vec<u8>, positions: Vec<JoinedPos>) -> Self {
        Self {
            seq,
            positions,
            alt_seq: Vec::new(),
        }
    }

    /// Absorb `other`: its sequence and alternates become alternates here.
    pub fn merge(&mut self, other: &RepeatGroup) {
        self.alt_seq.push(other.seq.clone());
        self.alt_seq.extend(other.alt_seq.iter().cloned());
        self.positions.extend_from_slice(&other.positions);
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn set_empty(&mut self) {
        self.positions.clear();
    }

    pub fn first_position(&self) -> Option<JoinedPos> {
        self.positions.first().copied()
    }
}

/// Single-pass repeat group builder over one joined genome.
pub struct RepeatBuilder<'a> {
    text: &'a [u8],
    translator: JoinedTranslator<'a>,
    groups: Vec<RepeatGroup>,
    mask: RepeatMask,
}

impl<'a> RepeatBuilder<'a> {
    /// Create a builder over `text`, which must be exactly the joined text
    /// described by `fragments`.
    pub fn new(text: &'a [u8], fragments: &'a FragmentTable) -> BuildResult<Self> {
        if text.len() as u64 != fragments.joined_len() {
            return Err(BuildError::LengthMismatch {
                text: text.len(),
                fragments: fragments.joined_len(),
            });
        }
        Ok(Self {
            text,
            translator: JoinedTranslator::new(fragments),
            groups: Vec::new(),
            mask: RepeatMask::new(text.len()),
        })
    }

    /// Run all stages over a sorted suffix ordering of the joined text.
    pub fn build<I>(
        &mut self,
        suffixes: I,
        params: &BuildParams,
        policy: &dyn MergePolicy,
    ) -> BuildResult<()>
    where
        I: IntoIterator<Item = JoinedPos>,
    {
        params.validate()?;

        let candidates = self.discover(suffixes, params)?;
        log::info!("Found {} candidate repeat groups", candidates);

        self.adjust_repeat_group(params.grouping, params.max_edit, policy);
        let masked = self.repeat_masking();
        self.sort_rpt_grp();

        let cache = self.translator.cache();
        log::debug!(
            "Fragment cache: {} hits, {} misses",
            cache.hits(),
            cache.misses()
        );
        log::info!(
            "Kept {} repeat groups covering {} bases",
            self.groups.len(),
            masked
        );
        Ok(())
    }

    fn discover<I>(&mut self, suffixes: I, params: &BuildParams) -> BuildResult<usize>
    where
        I: IntoIterator<Item = JoinedPos>,
    {
        let before = self.groups.len();
        let mut run: Vec<JoinedPos> = Vec::new();
        let mut run_lcp = u64::MAX;
        let mut prev: Option<JoinedPos> = None;
        let mut scanned = 0usize;

        for pos in suffixes {
            if pos as usize >= self.text.len() {
                return Err(BuildError::SuffixOutOfRange {
                    pos,
                    len: self.text.len(),
                });
            }
            scanned += 1;

            if let Some(p) = prev {
                let lcp = self.get_lcp(p, pos);
                if lcp >= params.min_repeat_len {
                    if run.is_empty() {
                        run.push(p);
                    }
                    run.push(pos);
                    run_lcp = run_lcp.min(lcp);
                } else {
                    self.flush_run(&mut run, run_lcp, params);
                    run_lcp = u64::MAX;
                }
            }
            prev = Some(pos);
        }
        self.flush_run(&mut run, run_lcp, params);

        if scanned != self.text.len() {
            log::warn!(
                "Suffix ordering has {} entries for a joined text of {} bases",
                scanned,
                self.text.len()
            );
        }
        Ok(self.groups.len() - before)
    }

    fn flush_run(&mut self, run: &mut Vec<JoinedPos>, lcp: u64, params: &BuildParams) {
        if run.len() >= params.min_repeat_count && self.is_left_maximal(run) {
            let start = run[0] as usize;
            let seq = self.text[start..start + lcp as usize].to_vec();
            self.add_repeat_group(seq, run.clone());
        }
        run.clear();
    }

    /// A run whose occurrences all follow the same base is the tail of a
    /// longer repeat.
    fn is_left_maximal(&mut self, positions: &[JoinedPos]) -> bool {
        let mut preceding: Option<u8> = None;
        for &p in positions {
            let at_fragment_start = self
                .translator
                .map_joined_pos_to_seq(p)
                .and_then(|idx| self.translator.table().get(idx))
                .map_or(true, |frag| frag.start == p);
            if at_fragment_start {
                return true;
            }
            let base = self.text[p as usize - 1];
            match preceding {
                None => preceding = Some(base),
                Some(b) if b != base => return true,
                _ => {}
            }
        }
        false
    }

    /// Common prefix of two suffixes, bounded by their fragments.
    pub fn get_lcp(&mut self, a: JoinedPos, b: JoinedPos) -> u64 {
        let (Some(end_a), Some(end_b)) = (
            self.translator.fragment_end(a),
            self.translator.fragment_end(b),
        ) else {
            return 0;
        };
        common_prefix_len(self.text, a, b, end_a, end_b)
    }

    pub fn add_repeat_group(&mut self, seq: Vec<u8>, mut positions: Vec<JoinedPos>) {
        positions.sort_unstable();
        self.groups.push(RepeatGroup::new(seq, positions));
    }

    /// Coalesce groups the policy considers equivalent. The most frequent
    /// group of a cluster keeps its sequence as representative.
    pub fn adjust_repeat_group(&mut self, grouping: bool, max_edit: usize, policy: &dyn MergePolicy) {
        if !grouping || self.groups.len() < 2 {
            return;
        }

        self.groups
            .sort_by(|a, b| b.positions.len().cmp(&a.positions.len()));

        let n = self.groups.len();
        let mut merged = 0usize;
        for i in 0..n {
            if self.groups[i].is_empty() {
                continue;
            }
            for j in (i + 1)..n {
                if self.groups[j].is_empty() {
                    continue;
                }
                let (head, tail) = self.groups.split_at_mut(j);
                if policy.should_merge(&head[i].seq, &tail[0].seq, max_edit) {
                    head[i].merge(&tail[0]);
                    tail[0].set_empty();
                    merged += 1;
                }
            }
        }

        self.groups.retain(|g| !g.is_empty());
        for group in &mut self.groups {
            group.positions.sort_unstable();
            group.positions.dedup();
        }
        log::debug!(
            "Merged {} groups with the {} policy",
            merged,
            policy.name()
        );
    }

    /// Mark accepted groups in the mask. Longer groups are placed first; a
    /// group whose every occurrence starts inside an already masked region is
    /// dropped. Returns the number of masked bases.
    pub fn repeat_masking(&mut self) -> usize {
        let mut order: Vec<usize> = (0..self.groups.len()).collect();
        order.sort_by(|&a, &b| self.groups[b].seq.len().cmp(&self.groups[a].seq.len()));

        let mut keep = vec![false; self.groups.len()];
        for idx in order {
            let group = &self.groups[idx];
            if group.positions.iter().all(|&p| self.mask.is_masked(p)) {
                continue;
            }
            let len = group.seq.len() as u64;
            for &p in &group.positions {
                self.mask.mark(p, len);
            }
            keep[idx] = true;
        }

        let mut keep = keep.into_iter();
        self.groups.retain(|_| keep.next().unwrap_or(false));
        self.mask.masked_len()
    }

    /// Order groups by first occurrence.
    pub fn sort_rpt_grp(&mut self) {
        self.groups.sort_by_key(|g| g.first_position());
    }

    pub fn groups(&self) -> &[RepeatGroup] {
        &self.groups
    }

    pub fn mask(&self) -> &RepeatMask {
        &self.mask
    }

    pub fn translator(&self) -> &JoinedTranslator<'a> {
        &self.translator
    }

    /// Joined text with repeat-covered bases replaced by `N`.
    pub fn non_repeat_text(&self) -> Vec<u8> {
        let mut text = self.text.to_vec();
        self.mask.apply(&mut text);
        text
    }

    /// Families laid out back to back in repeat-sequence space, one
    /// variant-free allele each.
    pub fn to_repeat_db(&self) -> RepeatDb {
        let mut db = RepeatDb::new();
        let mut rep_pos = 0u64;
        for (idx, group) in self.groups.iter().enumerate() {
            let positions = group
                .positions
                .iter()
                .map(|&p| RepeatCoord::joined(p, true))
                .collect();
            let len = group.seq.len() as u64;
            let mut repeat = Repeat::new(repeat_name(idx), idx as u64, rep_pos, len);
            repeat
                .alleles
                .push(RepeatAllele::without_variants(0, positions));
            db.push(repeat);
            rep_pos += len;
        }
        db
    }

    /// Write the families in the binary repeat database layout.
    pub fn save<W: Write>(&self, writer: &mut W, options: StoreOptions) -> BuildResult<()> {
        store::write_repeat_db(writer, &self.to_repeat_db(), options)?;
        Ok(())
    }

    /// Write representative sequences as FASTA, concatenation order matching
    /// the repeat-sequence coordinates of [`Self::to_repeat_db`].
    pub fn write_repeat_sequences<W: Write>(&self, writer: &mut W) -> BuildResult<()> {
        for (idx, group) in self.groups.iter().enumerate() {
            writeln!(writer, ">{}", repeat_name(idx))?;
            for line in group.seq.chunks(OUTPUT_WIDTH) {
                writer.write_all(line)?;
                writer.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    /// Write the non-repeat genome as FASTA: every reference sequence with
    /// repeat-covered and ambiguous bases as `N`. Ambiguous bases after a
    /// sequence's last fragment are not recorded and are not written.
    pub fn write_non_repeat_genome<W: Write>(&self, writer: &mut W) -> BuildResult<()> {
        let text = self.non_repeat_text();
        let table = self.translator.table();
        let mut fragments = table.fragments().iter().peekable();

        for (seq_id, name) in table.names().iter().enumerate() {
            let mut seq = Vec::new();
            while let Some(frag) = fragments.next_if(|f| f.seq_id == seq_id) {
                seq.resize(frag.start_in_seq as usize, b'N');
                seq.extend_from_slice(&text[frag.start as usize..frag.end() as usize]);
            }
            writeln!(writer, ">{}", name)?;
            for line in seq.chunks(OUTPUT_WIDTH) {
                writer.write_all(line)?;
                writer.write_all(b"\n")?;
            }
        }
        Ok(())
    }

    /// Write one summary line per group:
    /// name, length, occurrence count, alternate count, `seq:offset` list.
    pub fn write_repeat_groups<W: Write>(&mut self, writer: &mut W) -> BuildResult<()> {
        for idx in 0..self.groups.len() {
            let mut coords = Vec::with_capacity(self.groups[idx].positions.len());
            for pos_idx in 0..self.groups[idx].positions.len() {
                let pos = self.groups[idx].positions[pos_idx];
                match self.translator.genome_coord(pos) {
                    Some(coord) => coords.push(format!("{}:{}", coord.name, coord.offset)),
                    None => coords.push(format!("?:{}", pos)),
                }
            }
            let group = &self.groups[idx];
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}",
                repeat_name(idx),
                group.seq.len(),
                group.positions.len(),
                group.alt_seq.len(),
                coords.join(",")
            )?;
        }
        Ok(())
    }
}

fn repeat_name(idx: usize) -> String {
    format!("rpt_{}", idx)
}

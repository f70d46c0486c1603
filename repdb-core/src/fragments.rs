//! Joined-text fragments and coordinate translation
//!
//! A fragment is one stretch of unambiguous bases laid out in joined
//! coordinate space. Translation from a joined offset to a sequence-local
//! coordinate goes through a small round-robin cache because lookups made
//! while scanning a suffix ordering hit the same few fragments repeatedly.

use crate::reference::RefRecord;
use crate::types::{JoinedPos, Segment};

/// Number of fragments kept by [`FragmentCache`].
pub const CACHE_SIZE: usize = 10;

/// One contiguous block of a reference sequence in joined space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Offset within the joined text
    pub start: JoinedPos,
    pub length: u64,
    pub frag_id: usize,
    pub seq_id: usize,
    /// Offset of the block within its sequence
    pub start_in_seq: u64,
    /// First fragment of its sequence
    pub first: bool,
}

impl Fragment {
    pub fn contains(&self, pos: JoinedPos) -> bool {
        pos >= self.start && pos < self.start + self.length
    }

    pub fn end(&self) -> JoinedPos {
        self.start + self.length
    }
}

/// Sequence-local coordinate for a joined offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenomeCoord<'a> {
    pub seq_id: usize,
    pub name: &'a str,
    pub offset: u64,
}

/// Ordered list of fragments covering the joined text.
#[derive(Debug, Clone, Default)]
pub struct FragmentTable {
    fragments: Vec<Fragment>,
    names: Vec<String>,
}

impl FragmentTable {
    /// Build the table from reference records. Records of length zero only
    /// advance the sequence-local offset.
    pub fn from_records(records: &[RefRecord], names: &[String]) -> Self {
        let mut fragments = Vec::new();
        let mut joined = 0u64;
        let mut seq_id: Option<usize> = None;
        let mut in_seq = 0u64;
        let mut first_of_seq = false;

        for record in records {
            if record.first {
                seq_id = Some(seq_id.map_or(0, |id| id + 1));
                in_seq = 0;
                first_of_seq = true;
            }
            let Some(id) = seq_id else {
                // records before the first sequence header carry no bases we can name
                continue;
            };

            let start_in_seq = in_seq + record.off;
            in_seq = start_in_seq + record.len;

            if record.len == 0 {
                continue;
            }

            fragments.push(Fragment {
                start: joined,
                length: record.len,
                frag_id: fragments.len(),
                seq_id: id,
                start_in_seq,
                first: first_of_seq,
            });
            first_of_seq = false;
            joined += record.len;
        }

        log::debug!(
            "Built {} fragments over {} joined bases",
            fragments.len(),
            joined
        );

        Self {
            fragments,
            names: names.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn get(&self, frag_idx: usize) -> Option<&Fragment> {
        self.fragments.get(frag_idx)
    }

    pub fn seq_name(&self, seq_id: usize) -> Option<&str> {
        self.names.get(seq_id).map(|s| s.as_str())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Total number of joined bases.
    pub fn joined_len(&self) -> u64 {
        self.fragments.last().map_or(0, |f| f.end())
    }

    /// Binary search for the fragment containing `pos`.
    pub fn find(&self, pos: JoinedPos) -> Option<usize> {
        let idx = self.fragments.partition_point(|f| f.end() <= pos);
        match self.fragments.get(idx) {
            Some(f) if f.contains(pos) => Some(idx),
            _ => None,
        }
    }

    /// Segment table in the form consumed by `RepeatDb::construct`.
    pub fn segments(&self) -> Vec<Segment> {
        self.fragments
            .iter()
            .map(|f| Segment::new(f.start, f.seq_id as u64, f.start_in_seq))
            .collect()
    }
}

/// Fixed-capacity fragment cache with round-robin eviction.
#[derive(Debug, Clone)]
pub struct FragmentCache {
    slots: [usize; CACHE_SIZE],
    num_cached: usize,
    victim: usize,
    hits: u64,
    misses: u64,
}

impl FragmentCache {
    pub fn new() -> Self {
        Self {
            slots: [0; CACHE_SIZE],
            num_cached: 0,
            victim: 0,
            hits: 0,
            misses: 0,
        }
    }

    /// Fragment index containing `pos`, consulting the cache before the table.
    pub fn lookup(&mut self, table: &FragmentTable, pos: JoinedPos) -> Option<usize> {
        for &frag_idx in &self.slots[..self.num_cached] {
            if table.fragments[frag_idx].contains(pos) {
                self.hits += 1;
                return Some(frag_idx);
            }
        }

        self.misses += 1;
        let frag_idx = table.find(pos)?;

        if self.num_cached < CACHE_SIZE {
            self.slots[self.num_cached] = frag_idx;
            self.num_cached += 1;
        } else {
            self.slots[self.victim] = frag_idx;
            self.victim = (self.victim + 1) % CACHE_SIZE;
        }
        Some(frag_idx)
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn cached(&self) -> &[usize] {
        &self.slots[..self.num_cached]
    }
}

impl Default for FragmentCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cached joined-offset translator over a fragment table.
#[derive(Debug, Clone)]
pub struct JoinedTranslator<'a> {
    table: &'a FragmentTable,
    cache: FragmentCache,
}

impl<'a> JoinedTranslator<'a> {
    pub fn new(table: &'a FragmentTable) -> Self {
        Self {
            table,
            cache: FragmentCache::new(),
        }
    }

    pub fn table(&self) -> &'a FragmentTable {
        self.table
    }

    /// Index of the fragment containing `joined_pos`.
    pub fn map_joined_pos_to_seq(&mut self, joined_pos: JoinedPos) -> Option<usize> {
        self.cache.lookup(self.table, joined_pos)
    }

    /// Sequence id, name and local offset of `joined_pos`.
    pub fn genome_coord(&mut self, joined_pos: JoinedPos) -> Option<GenomeCoord<'a>> {
        let frag_idx = self.map_joined_pos_to_seq(joined_pos)?;
        let table = self.table;
        let frag = &table.fragments[frag_idx];
        Some(GenomeCoord {
            seq_id: frag.seq_id,
            name: table.seq_name(frag.seq_id).unwrap_or(""),
            offset: joined_pos - frag.start + frag.start_in_seq,
        })
    }

    /// Exclusive end of the fragment containing `joined_pos`.
    pub fn fragment_end(&mut self, joined_pos: JoinedPos) -> Option<JoinedPos> {
        let frag_idx = self.map_joined_pos_to_seq(joined_pos)?;
        Some(self.table.fragments[frag_idx].end())
    }

    pub fn cache(&self) -> &FragmentCache {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::join_sequences;

    fn two_chromosomes() -> FragmentTable {
        let chr1 = vec![b'A'; 1000];
        let chr2 = vec![b'C'; 2000];
        let joined = join_sequences(&[("chr1", chr1), ("chr2", chr2)]);
        FragmentTable::from_records(&joined.records, &joined.names)
    }

    #[test]
    fn test_fragments_from_records() {
        let records = vec![
            RefRecord::new(5, 10, true),
            RefRecord::new(3, 4, false),
            RefRecord::new(0, 0, true),
            RefRecord::new(0, 6, true),
        ];
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let table = FragmentTable::from_records(&records, &names);

        assert_eq!(table.len(), 3);
        let f = table.fragments();
        assert_eq!((f[0].start, f[0].seq_id, f[0].start_in_seq), (0, 0, 5));
        assert_eq!((f[1].start, f[1].seq_id, f[1].start_in_seq), (10, 0, 18));
        assert_eq!((f[2].start, f[2].seq_id, f[2].start_in_seq), (14, 2, 0));
        assert!(f[0].first);
        assert!(!f[1].first);
        assert_eq!(table.joined_len(), 20);
    }

    #[test]
    fn test_find_and_segments() {
        let table = two_chromosomes();
        assert_eq!(table.find(0), Some(0));
        assert_eq!(table.find(999), Some(0));
        assert_eq!(table.find(1000), Some(1));
        assert_eq!(table.find(2999), Some(1));
        assert_eq!(table.find(3000), None);

        assert_eq!(
            table.segments(),
            vec![Segment::new(0, 0, 0), Segment::new(1000, 1, 0)]
        );
    }

    #[test]
    fn test_genome_coord() {
        let table = two_chromosomes();
        let mut translator = JoinedTranslator::new(&table);
        let coord = translator.genome_coord(1200).unwrap();
        assert_eq!(coord.seq_id, 1);
        assert_eq!(coord.name, "chr2");
        assert_eq!(coord.offset, 200);
        assert_eq!(translator.fragment_end(10), Some(1000));
        assert!(translator.genome_coord(5000).is_none());
    }

    #[test]
    fn test_cache_round_robin_eviction() {
        let records: Vec<RefRecord> = (0..12).map(|_| RefRecord::new(0, 10, true)).collect();
        let names: Vec<String> = (0..12).map(|i| format!("s{}", i)).collect();
        let table = FragmentTable::from_records(&records, &names);
        let mut cache = FragmentCache::new();

        for frag in 0..CACHE_SIZE {
            assert_eq!(cache.lookup(&table, frag as u64 * 10), Some(frag));
        }
        assert_eq!(cache.misses(), CACHE_SIZE as u64);

        // full cache: the next two misses overwrite slots 0 and 1
        assert_eq!(cache.lookup(&table, 100), Some(10));
        assert_eq!(cache.lookup(&table, 110), Some(11));
        assert_eq!(cache.cached()[0], 10);
        assert_eq!(cache.cached()[1], 11);
        assert_eq!(cache.cached()[2], 2);

        // a recently used fragment is not protected from eviction
        assert_eq!(cache.lookup(&table, 25), Some(2));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.lookup(&table, 5), Some(0));
        assert_eq!(cache.cached()[2], 0);
    }

    #[test]
    fn test_cache_miss_on_unmapped_position() {
        let table = two_chromosomes();
        let mut cache = FragmentCache::new();
        assert_eq!(cache.lookup(&table, 10_000), None);
        assert!(cache.cached().is_empty());
    }
}

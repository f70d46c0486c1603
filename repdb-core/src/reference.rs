//! Joining reference sequences into a single text
//!
//! Every sequence is split into stretches of unambiguous bases. The stretches
//! are concatenated into the joined text; runs of ambiguous bases are left out
//! and recorded as skips so that joined offsets can be translated back.

/// One stretch of unambiguous bases of a reference sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefRecord {
    /// Ambiguous bases skipped immediately before this stretch
    pub off: u64,
    /// Length of the stretch
    pub len: u64,
    /// First record of a new sequence
    pub first: bool,
}

impl RefRecord {
    pub fn new(off: u64, len: u64, first: bool) -> Self {
        Self { off, len, first }
    }
}

/// Concatenated reference text with the records describing its layout.
#[derive(Debug, Clone, Default)]
pub struct JoinedReference {
    /// Uppercase ACGT text without ambiguous runs
    pub text: Vec<u8>,
    pub records: Vec<RefRecord>,
    /// Sequence names, one per record flagged `first`
    pub names: Vec<String>,
}

impl JoinedReference {
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn num_sequences(&self) -> usize {
        self.names.len()
    }
}

/// Join named sequences. Names are truncated at the first whitespace.
pub fn join_sequences<N, S>(sequences: &[(N, S)]) -> JoinedReference
where
    N: AsRef<str>,
    S: AsRef<[u8]>,
{
    let mut joined = JoinedReference::default();

    for (name, seq) in sequences {
        let name = name.as_ref().split_whitespace().next().unwrap_or("");
        joined.names.push(name.to_string());

        let mut first = true;
        let mut skipped = 0u64;
        let mut stretch = 0u64;

        for &base in seq.as_ref() {
            let upper = base.to_ascii_uppercase();
            if is_unambiguous(upper) {
                joined.text.push(upper);
                stretch += 1;
            } else {
                if stretch > 0 {
                    joined.records.push(RefRecord::new(skipped, stretch, first));
                    first = false;
                    skipped = 0;
                    stretch = 0;
                }
                skipped += 1;
            }
        }

        if stretch > 0 || first {
            // a sequence that is entirely ambiguous still owns one record
            joined.records.push(RefRecord::new(skipped, stretch, first));
        }
    }

    joined
}

fn is_unambiguous(base: u8) -> bool {
    matches!(base, b'A' | b'C' | b'G' | b'T')
}

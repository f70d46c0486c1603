//! Command implementations for the repdb CLI

pub mod build;
pub mod info;
pub mod query;

use anyhow::Result;
use repdb_core::{join_sequences, FragmentTable, JoinedReference};
use std::path::Path;

use crate::fasta;

/// Load a reference and lay it out in joined coordinates.
pub(crate) fn load_reference(path: &Path) -> Result<(JoinedReference, FragmentTable)> {
    let sequences = fasta::read_sequences(path)?;
    let joined = join_sequences(&sequences);
    let table = FragmentTable::from_records(&joined.records, &joined.names);
    log::info!(
        "Joined {} sequences into {} bases ({} fragments)",
        joined.num_sequences(),
        joined.len(),
        table.len()
    );
    Ok((joined, table))
}

//! Reference loading via needletail

use anyhow::Result;
use needletail::parse_fastx_file;
use std::path::Path;

use crate::error::CliError;

/// Read every record of a FASTA/FASTQ file (plain or gzipped) as
/// `(id, sequence)` pairs in file order.
pub fn read_sequences(path: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    if !path.exists() {
        return Err(CliError::file_not_found(path.to_path_buf()).into());
    }

    let file = path.display().to_string();
    let mut reader =
        parse_fastx_file(path).map_err(|e| CliError::parse(file.as_str(), e.to_string()))?;

    let mut sequences = Vec::new();
    while let Some(record) = reader.next() {
        let record = record.map_err(|e| CliError::parse(file.as_str(), e.to_string()))?;
        let id = String::from_utf8_lossy(record.id()).to_string();
        sequences.push((id, record.seq().to_vec()));
    }

    if sequences.is_empty() {
        return Err(CliError::invalid_format(format!("no sequences found in {}", file)).into());
    }

    log::debug!("Read {} sequences from {}", sequences.len(), file);
    Ok(sequences)
}

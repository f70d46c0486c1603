//! Binary repeat database store
//!
//! Layout, every `IDX` being an index-width integer in the file's byte order:
//! - RepeatDB     { numRepeats, Repeat* }
//! - Repeat       { repID, repPos, repLen, numAlleles, RepeatAllele* }
//! - RepeatAllele { alleleID, numSNPs, snpID*, numPositions, (joinedOff, fw:u8)* }
//!
//! There is no header. Index width and byte order are not recorded in the
//! file and must be supplied by the reader. Repeat names and resolved
//! coordinates are not stored.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repeat::{Repeat, RepeatAllele, RepeatDb};
use crate::types::RepeatCoord;

/// Upper bound on capacity reserved from an untrusted count.
const MAX_PREALLOC: usize = 1 << 16;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Truncated stream while reading {0}")]
    Truncated(&'static str),

    #[error("Value {value} does not fit in a {width:?} index")]
    Overflow { value: u64, width: IndexWidth },

    #[error("Data corruption: {0}")]
    Corruption(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Width of every integer field except the strand byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexWidth {
    #[default]
    U32,
    U64,
}

impl IndexWidth {
    pub fn bytes(self) -> usize {
        match self {
            IndexWidth::U32 => 4,
            IndexWidth::U64 => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreOptions {
    pub width: IndexWidth,
    pub big_endian: bool,
}

impl StoreOptions {
    pub fn new(width: IndexWidth, big_endian: bool) -> Self {
        Self { width, big_endian }
    }
}

/// Write `db` to `writer`.
pub fn write_repeat_db<W: Write>(
    writer: &mut W,
    db: &RepeatDb,
    options: StoreOptions,
) -> StoreResult<()> {
    write_repeats(writer, db.repeats(), options)
}

/// Write a family list, resolved or not, to `writer`.
pub fn write_repeats<W: Write>(
    writer: &mut W,
    repeats: &[Repeat],
    options: StoreOptions,
) -> StoreResult<()> {
    if options.big_endian {
        write_all::<BigEndian, W>(writer, repeats, options.width)
    } else {
        write_all::<LittleEndian, W>(writer, repeats, options.width)
    }
}

/// Read a database from `reader`. Families are named `rpt_<id>`.
pub fn read_repeat_db<R: Read>(reader: &mut R, options: StoreOptions) -> StoreResult<RepeatDb> {
    let repeats = if options.big_endian {
        read_all::<BigEndian, R>(reader, options.width)?
    } else {
        read_all::<LittleEndian, R>(reader, options.width)?
    };
    Ok(RepeatDb::from_repeats(repeats))
}

/// Write the database to a file
pub fn save_to_file<P: AsRef<Path>>(
    path: P,
    repeats: &[Repeat],
    options: StoreOptions,
) -> StoreResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_repeats(&mut writer, repeats, options)?;
    writer.flush()?;
    Ok(())
}

/// Read the database from a file
pub fn load_from_file<P: AsRef<Path>>(path: P, options: StoreOptions) -> StoreResult<RepeatDb> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    read_repeat_db(&mut reader, options)
}

fn write_all<B: ByteOrder, W: Write>(
    writer: &mut W,
    repeats: &[Repeat],
    width: IndexWidth,
) -> StoreResult<()> {
    write_index::<B, W>(writer, width, repeats.len() as u64)?;
    for repeat in repeats {
        write_index::<B, W>(writer, width, repeat.id)?;
        write_index::<B, W>(writer, width, repeat.pos)?;
        write_index::<B, W>(writer, width, repeat.len)?;
        write_index::<B, W>(writer, width, repeat.alleles.len() as u64)?;
        for allele in &repeat.alleles {
            write_allele::<B, W>(writer, width, allele)?;
        }
    }
    Ok(())
}

fn write_allele<B: ByteOrder, W: Write>(
    writer: &mut W,
    width: IndexWidth,
    allele: &RepeatAllele,
) -> StoreResult<()> {
    write_index::<B, W>(writer, width, allele.allele_id)?;
    write_index::<B, W>(writer, width, allele.snp_ids.len() as u64)?;
    for &snp_id in &allele.snp_ids {
        write_index::<B, W>(writer, width, snp_id)?;
    }
    write_index::<B, W>(writer, width, allele.positions.len() as u64)?;
    for pos in &allele.positions {
        write_index::<B, W>(writer, width, pos.joined_off)?;
        writer.write_u8(pos.fw as u8)?;
    }
    Ok(())
}

fn write_index<B: ByteOrder, W: Write>(
    writer: &mut W,
    width: IndexWidth,
    value: u64,
) -> StoreResult<()> {
    match width {
        IndexWidth::U32 => {
            let narrow = u32::try_from(value).map_err(|_| StoreError::Overflow { value, width })?;
            writer.write_u32::<B>(narrow)?;
        }
        IndexWidth::U64 => writer.write_u64::<B>(value)?,
    }
    Ok(())
}

fn read_all<B: ByteOrder, R: Read>(reader: &mut R, width: IndexWidth) -> StoreResult<Vec<Repeat>> {
    let num_repeats = read_count::<B, R>(reader, width, "repeat count")?;
    let mut repeats = Vec::with_capacity(num_repeats.min(MAX_PREALLOC));
    for _ in 0..num_repeats {
        let id = read_index::<B, R>(reader, width, "repeat id")?;
        let pos = read_index::<B, R>(reader, width, "repeat position")?;
        let len = read_index::<B, R>(reader, width, "repeat length")?;
        if pos.checked_add(len).is_none() {
            return Err(StoreError::Corruption(format!(
                "repeat {} at {} with length {} overflows the repeat sequence",
                id, pos, len
            )));
        }
        let mut repeat = Repeat::new(format!("rpt_{}", id), id, pos, len);

        let num_alleles = read_count::<B, R>(reader, width, "allele count")?;
        repeat.alleles.reserve(num_alleles.min(MAX_PREALLOC));
        for _ in 0..num_alleles {
            repeat.alleles.push(read_allele::<B, R>(reader, width)?);
        }
        repeats.push(repeat);
    }

    log::debug!("Read {} repeat families", repeats.len());
    Ok(repeats)
}

fn read_allele<B: ByteOrder, R: Read>(reader: &mut R, width: IndexWidth) -> StoreResult<RepeatAllele> {
    let allele_id = read_index::<B, R>(reader, width, "allele id")?;

    let num_snps = read_count::<B, R>(reader, width, "SNP count")?;
    let mut snp_ids = Vec::with_capacity(num_snps.min(MAX_PREALLOC));
    for _ in 0..num_snps {
        snp_ids.push(read_index::<B, R>(reader, width, "SNP id")?);
    }

    let num_positions = read_count::<B, R>(reader, width, "position count")?;
    let mut positions = Vec::with_capacity(num_positions.min(MAX_PREALLOC));
    for _ in 0..num_positions {
        let joined_off = read_index::<B, R>(reader, width, "joined offset")?;
        let fw = match reader.read_u8().map_err(|e| truncated(e, "strand"))? {
            0 => false,
            1 => true,
            other => {
                return Err(StoreError::Corruption(format!(
                    "invalid strand byte {} in allele {}",
                    other, allele_id
                )))
            }
        };
        positions.push(RepeatCoord::joined(joined_off, fw));
    }

    RepeatAllele::new(allele_id, snp_ids, positions)
        .map_err(|e| StoreError::Corruption(e.to_string()))
}

fn read_index<B: ByteOrder, R: Read>(
    reader: &mut R,
    width: IndexWidth,
    field: &'static str,
) -> StoreResult<u64> {
    let value = match width {
        IndexWidth::U32 => reader.read_u32::<B>().map(u64::from),
        IndexWidth::U64 => reader.read_u64::<B>(),
    };
    value.map_err(|e| truncated(e, field))
}

fn read_count<B: ByteOrder, R: Read>(
    reader: &mut R,
    width: IndexWidth,
    field: &'static str,
) -> StoreResult<usize> {
    let count = read_index::<B, R>(reader, width, field)?;
    usize::try_from(count)
        .map_err(|_| StoreError::Corruption(format!("{} {} exceeds address space", field, count)))
}

fn truncated(err: std::io::Error, field: &'static str) -> StoreError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        StoreError::Truncated(field)
    } else {
        StoreError::Io(err)
    }
}

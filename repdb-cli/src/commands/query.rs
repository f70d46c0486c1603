//! Query command implementation - common coordinates of two repeat intervals

use anyhow::{Context, Result};
use repdb_core::store::load_from_file;
use repdb_core::{Alt, AltDb, CommonCoordQuery, CoordPair, RepeatCoord, SnpId};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::CliError;

/// One interval in repeat-sequence space with the variants a read carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub left: u64,
    pub right: u64,
    pub snp_ids: Vec<SnpId>,
}

#[derive(Debug, Clone, Serialize)]
struct Located<'a> {
    seq: &'a str,
    offset: u64,
    joined_off: u64,
    strand: char,
}

#[derive(Debug, Clone, Serialize)]
struct LocatedPair<'a> {
    first: Located<'a>,
    second: Located<'a>,
}

#[allow(clippy::too_many_arguments)]
pub fn execute(
    config: &Config,
    db: PathBuf,
    reference: PathBuf,
    alts: Option<PathBuf>,
    first: Interval,
    second: Interval,
    distance: Option<u64>,
    json: bool,
) -> Result<()> {
    for interval in [&first, &second] {
        if interval.left > interval.right {
            return Err(CliError::validation(format!(
                "interval [{}, {}] has its left edge past its right edge",
                interval.left, interval.right
            ))
            .into());
        }
    }
    if !db.exists() {
        return Err(CliError::file_not_found(db).into());
    }

    let repeat_db = load_from_file(&db, config.store.options())
        .map_err(|e| CliError::database(format!("{}: {}", db.display(), e)))?;
    let (joined, table) = super::load_reference(&reference)?;
    let resolved = repeat_db
        .construct(&table.segments())
        .map_err(|e| CliError::database(e.to_string()))?;
    log::info!(
        "Loaded {} repeat families with {} positions",
        resolved.len(),
        resolved.num_positions()
    );

    let alt_db = match alts {
        Some(path) => read_alts(&path)?,
        None => AltDb::default(),
    };

    let query = CommonCoordQuery::new(first.left, first.right, second.left, second.right)
        .with_snp_ids(first.snp_ids, second.snp_ids)
        .with_distance(distance.unwrap_or(config.query.distance))
        .with_allele_indexing(config.query.allele_indexing);

    let mut pairs = Vec::new();
    let found = resolved
        .find_common_coords(&query, &alt_db, &mut pairs)
        .map_err(|e| CliError::validation(e.to_string()))?;
    if !found {
        log::info!("No common coordinates found");
    }

    let names = &joined.names;
    let located: Vec<LocatedPair> = pairs.iter().map(|p| locate_pair(p, names)).collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&located)?);
    } else {
        for pair in &located {
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                pair.first.seq,
                pair.first.offset,
                pair.first.strand,
                pair.second.seq,
                pair.second.offset,
                pair.second.strand
            );
        }
    }
    Ok(())
}

fn locate<'a>(coord: &RepeatCoord, names: &'a [String]) -> Located<'a> {
    Located {
        seq: names.get(coord.tid as usize).map_or("?", |n| n.as_str()),
        offset: coord.toff,
        joined_off: coord.joined_off,
        strand: coord.strand().into(),
    }
}

fn locate_pair<'a>(pair: &CoordPair, names: &'a [String]) -> LocatedPair<'a> {
    LocatedPair {
        first: locate(&pair.first, names),
        second: locate(&pair.second, names),
    }
}

fn read_alts(path: &Path) -> Result<AltDb> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read variant file: {}", path.display()))?;
    Ok(parse_alts(&content, &path.display().to_string())?)
}

/// Parse a tab-separated `pos<TAB>left` variant table. Blank lines and lines
/// starting with `#` are skipped.
pub fn parse_alts(content: &str, file: &str) -> Result<AltDb, CliError> {
    let mut alts = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 2 {
            return Err(CliError::parse(
                file,
                format!("line {}: expected pos and left columns", idx + 1),
            ));
        }
        let parse = |field: &str| {
            field.trim().parse::<u64>().map_err(|e| {
                CliError::parse(file, format!("line {}: '{}': {}", idx + 1, field, e))
            })
        };
        alts.push(Alt::new(parse(fields[0])?, parse(fields[1])?));
    }
    Ok(AltDb::new(alts))
}

/// SNP ids parsed from a single comma-separated argument.
pub type SnpList = Vec<SnpId>;

/// Parse a comma-separated list of SNP ids; an empty string is an empty list.
pub fn parse_snp_ids(value: &str) -> Result<SnpList, String> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    let ids = value
        .split(',')
        .map(|s| s.trim().parse::<SnpId>().map_err(|e| format!("'{}': {}", s, e)))
        .collect::<Result<Vec<_>, _>>()?;
    if !ids.windows(2).all(|w| w[0] < w[1]) {
        return Err("SNP ids must be strictly ascending".to_string());
    }
    Ok(ids)
}

//! Build command implementation - discover repeats in a reference and write
//! the repeat database and the non-repeat genome

use anyhow::{Context, Result};
use repdb_core::suffix::naive_suffix_array;
use repdb_core::RepeatBuilder;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::CliError;

/// Files written by a build, derived from the output prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutputs {
    pub database: PathBuf,
    pub sequences: PathBuf,
    pub groups: PathBuf,
    pub non_repeat: PathBuf,
}

impl BuildOutputs {
    pub fn from_prefix(prefix: &Path) -> Self {
        let with_suffix = |suffix: &str| {
            let mut name = prefix.as_os_str().to_owned();
            name.push(suffix);
            PathBuf::from(name)
        };
        Self {
            database: with_suffix(".rep.db"),
            sequences: with_suffix(".rep.fa"),
            groups: with_suffix(".rep.info"),
            non_repeat: with_suffix(".nonrep.fa"),
        }
    }
}

pub fn execute(config: &Config, reference: PathBuf, out: PathBuf) -> Result<()> {
    log::info!("Starting repeat database build");
    log::info!("Reference: {}", reference.display());

    let params = config.build.params();
    params
        .validate()
        .map_err(|e| CliError::validation(e.to_string()))?;
    let policy = config.build.merge_policy()?;

    let (joined, table) = super::load_reference(&reference)?;
    if joined.is_empty() {
        return Err(CliError::invalid_format(format!(
            "{} contains no unambiguous bases",
            reference.display()
        ))
        .into());
    }

    log::info!("Sorting {} suffixes", joined.len());
    let suffixes = naive_suffix_array(&joined.text);

    let mut builder =
        RepeatBuilder::new(&joined.text, &table).context("Failed to initialise repeat builder")?;
    builder
        .build(suffixes, &params, policy.as_ref())
        .context("Failed to build repeat groups")?;

    let outputs = BuildOutputs::from_prefix(&out);
    let options = config.store.options();

    let mut db_writer = create(&outputs.database)?;
    builder
        .save(&mut db_writer, options)
        .context("Failed to write repeat database")?;
    db_writer.flush()?;

    let mut fa_writer = create(&outputs.sequences)?;
    builder
        .write_repeat_sequences(&mut fa_writer)
        .context("Failed to write repeat sequences")?;
    fa_writer.flush()?;

    let mut info_writer = create(&outputs.groups)?;
    builder
        .write_repeat_groups(&mut info_writer)
        .context("Failed to write repeat group summary")?;
    info_writer.flush()?;

    let mut nonrep_writer = create(&outputs.non_repeat)?;
    builder
        .write_non_repeat_genome(&mut nonrep_writer)
        .context("Failed to write non-repeat genome")?;
    nonrep_writer.flush()?;
    log::info!(
        "Non-repeat genome keeps {} of {} bases in {} stretches",
        joined.len() - builder.mask().masked_len(),
        joined.len(),
        builder.mask().unmasked_ranges().len()
    );

    log::info!(
        "Wrote {} repeat families to {} ({:?}, {})",
        builder.groups().len(),
        outputs.database.display(),
        options.width,
        if options.big_endian { "big-endian" } else { "little-endian" }
    );
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    Ok(BufWriter::new(file))
}

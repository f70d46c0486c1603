use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use repdb_core::{AlleleIndexing, IndexWidth};
use std::path::PathBuf;

mod commands;
mod config;
mod error;
mod fasta;

use commands::query::{parse_snp_ids, Interval, SnpList};
use config::Config;
use error::{print_error_and_exit, CliError};

#[derive(Parser)]
#[command(name = "repdb")]
#[command(about = "repdb - repeat index for genomes")]
#[command(version)]
#[command(long_about = "
repdb finds repeated sequence families in a genome, stores them in a compact
repeat database, and reports genomic occurrence pairs for intervals of the
repeat sequence.

Examples:
  repdb build --ref genome.fa --out genome
  repdb info --db genome.rep.db --families
  repdb query --db genome.rep.db --ref genome.fa --left 0 --right 50 --left2 300 --right2 350
  repdb config > repdb.toml
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database integer width (overrides [store] index_width)
    #[arg(long, global = true)]
    pub index_width: Option<WidthArg>,

    /// Read and write big-endian databases (overrides [store] big_endian)
    #[arg(long, global = true)]
    pub big_endian: bool,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover repeat families and write the repeat database
    Build {
        /// Reference sequence file (FASTA/FASTQ)
        #[arg(long, required = true)]
        r#ref: PathBuf,

        /// Output prefix; writes <out>.rep.db, <out>.rep.fa, <out>.rep.info and <out>.nonrep.fa
        #[arg(short, long, required = true)]
        out: PathBuf,

        /// Minimum repeat length
        #[arg(long)]
        min_repeat_len: Option<u64>,

        /// Minimum number of occurrences
        #[arg(long)]
        min_repeat_count: Option<usize>,

        /// Merge near-identical repeat groups
        #[arg(long)]
        grouping: bool,

        /// Edit distance tolerated when merging
        #[arg(long)]
        max_edit: Option<usize>,
    },

    /// Summarise a repeat database
    Info {
        /// Repeat database file
        #[arg(long, required = true)]
        db: PathBuf,

        /// List every family
        #[arg(long)]
        families: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Report occurrence pairs for two intervals of the repeat sequence
    Query {
        /// Repeat database file
        #[arg(long, required = true)]
        db: PathBuf,

        /// Reference the database was built from (FASTA/FASTQ)
        #[arg(long, required = true)]
        r#ref: PathBuf,

        /// Variant table, tab-separated `pos<TAB>left` per line
        #[arg(long)]
        alts: Option<PathBuf>,

        #[arg(long)]
        left: u64,

        #[arg(long)]
        right: u64,

        /// Comma-separated SNP ids carried in the first interval
        #[arg(long, default_value = "", value_parser = parse_snp_ids)]
        snps: SnpList,

        #[arg(long)]
        left2: u64,

        #[arg(long)]
        right2: u64,

        /// Comma-separated SNP ids carried in the second interval
        #[arg(long, default_value = "", value_parser = parse_snp_ids)]
        snps2: SnpList,

        /// Maximum distance between paired occurrences
        #[arg(short, long)]
        distance: Option<u64>,

        /// Pair alleles the way older builds did
        #[arg(long)]
        legacy_allele_index: bool,

        /// Print JSON instead of tab-separated text
        #[arg(long)]
        json: bool,
    },

    /// Print an example configuration file
    Config {
        /// Write the example to a file instead of stdout
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum WidthArg {
    U32,
    U64,
}

impl From<WidthArg> for IndexWidth {
    fn from(width: WidthArg) -> Self {
        match width {
            WidthArg::U32 => IndexWidth::U32,
            WidthArg::U64 => IndexWidth::U64,
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) -> Result<()> {
    if quiet {
        std::env::set_var("RUST_LOG", "error");
    } else {
        let level = match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        std::env::set_var("RUST_LOG", level);
    }

    env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .init();

    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    setup_logging(cli.verbose, cli.quiet)?;

    // Load configuration
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(width) = cli.index_width {
        config.store.index_width = width.into();
    }
    if cli.big_endian {
        config.store.big_endian = true;
    }

    match cli.command {
        Commands::Build {
            r#ref,
            out,
            min_repeat_len,
            min_repeat_count,
            grouping,
            max_edit,
        } => {
            if let Some(len) = min_repeat_len {
                config.build.min_repeat_len = len;
            }
            if let Some(count) = min_repeat_count {
                config.build.min_repeat_count = count;
            }
            if let Some(edit) = max_edit {
                config.build.max_edit = edit;
            }
            config.build.grouping |= grouping;
            commands::build::execute(&config, r#ref, out)?;
        }

        Commands::Info { db, families, json } => {
            commands::info::execute(&config, db, families, json)?;
        }

        Commands::Query {
            db,
            r#ref,
            alts,
            left,
            right,
            snps,
            left2,
            right2,
            snps2,
            distance,
            legacy_allele_index,
            json,
        } => {
            if legacy_allele_index {
                config.query.allele_indexing = AlleleIndexing::LegacyOuterIndex;
            }
            let first = Interval {
                left,
                right,
                snp_ids: snps,
            };
            let second = Interval {
                left: left2,
                right: right2,
                snp_ids: snps2,
            };
            commands::query::execute(&config, db, r#ref, alts, first, second, distance, json)?;
        }

        Commands::Config { write } => match write {
            Some(path) => {
                Config::default().save_to_file(&path)?;
                log::info!("Wrote example configuration to {}", path.display());
            }
            None => print!("{}", Config::example_toml()?),
        },
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => Ok(()),
        Err(err) => match err.downcast_ref::<CliError>() {
            Some(cli_err) => print_error_and_exit(cli_err),
            None => Err(err),
        },
    }
}

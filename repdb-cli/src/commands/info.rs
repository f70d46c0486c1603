//! Info command implementation - summarise a repeat database

use anyhow::Result;
use repdb_core::store::load_from_file;
use repdb_core::RepeatDb;
use serde::Serialize;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::CliError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilySummary {
    pub name: String,
    pub id: u64,
    pub pos: u64,
    pub len: u64,
    pub alleles: usize,
    pub positions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbSummary {
    pub families: usize,
    pub alleles: usize,
    pub positions: usize,
    /// Total length of the repeat sequence
    pub repeat_len: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub family_list: Vec<FamilySummary>,
}

impl DbSummary {
    pub fn from_db(db: &RepeatDb, with_families: bool) -> Self {
        let repeats = db.repeats();
        let family_list = if with_families {
            repeats
                .iter()
                .map(|r| FamilySummary {
                    name: r.name.clone(),
                    id: r.id,
                    pos: r.pos,
                    len: r.len,
                    alleles: r.alleles.len(),
                    positions: r.num_positions(),
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            families: repeats.len(),
            alleles: repeats.iter().map(|r| r.alleles.len()).sum(),
            positions: db.num_positions(),
            repeat_len: repeats.iter().map(|r| r.end()).max().unwrap_or(0),
            family_list,
        }
    }

    pub fn to_text(&self) -> String {
        let mut text = format!(
            "families\t{}\nalleles\t{}\npositions\t{}\nrepeat_len\t{}\n",
            self.families, self.alleles, self.positions, self.repeat_len
        );
        for family in &self.family_list {
            text.push_str(&format!(
                "{}\t{}\t{}\t{}\t{}\n",
                family.name, family.pos, family.len, family.alleles, family.positions
            ));
        }
        text
    }
}

pub fn execute(config: &Config, db: PathBuf, families: bool, json: bool) -> Result<()> {
    if !db.exists() {
        return Err(CliError::file_not_found(db).into());
    }

    let repeat_db = load_from_file(&db, config.store.options())
        .map_err(|e| CliError::database(format!("{}: {}", db.display(), e)))?;
    let summary = DbSummary::from_db(&repeat_db, families);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", summary.to_text());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use repdb_core::{Repeat, RepeatAllele, RepeatCoord};

    fn db() -> RepeatDb {
        let mut a = Repeat::new("rpt_0", 0, 0, 120);
        a.alleles.push(RepeatAllele::without_variants(
            0,
            vec![RepeatCoord::joined(5, true), RepeatCoord::joined(900, true)],
        ));
        let mut b = Repeat::new("rpt_1", 1, 120, 80);
        b.alleles
            .push(RepeatAllele::without_variants(0, vec![RepeatCoord::joined(40, true)]));
        b.alleles
            .push(RepeatAllele::without_variants(1, vec![RepeatCoord::joined(70, true)]));
        RepeatDb::from_repeats(vec![a, b])
    }

    #[test]
    fn test_summary_counts() {
        let summary = DbSummary::from_db(&db(), false);
        assert_eq!(summary.families, 2);
        assert_eq!(summary.alleles, 3);
        assert_eq!(summary.positions, 4);
        assert_eq!(summary.repeat_len, 200);
        assert!(summary.family_list.is_empty());
    }

    #[test]
    fn test_summary_json_lists_families_on_request() {
        let json = serde_json::to_string(&DbSummary::from_db(&db(), false)).unwrap();
        assert!(!json.contains("family_list"));

        let summary = DbSummary::from_db(&db(), true);
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["family_list"][1]["alleles"], 2);
        assert!(summary.to_text().contains("rpt_1\t120\t80\t2\t2\n"));
    }
}

use repdb_core::store::{load_from_file, read_repeat_db, write_repeat_db};
use repdb_core::suffix::naive_suffix_array;
use repdb_core::{
    join_sequences, AltDb, BuildParams, CommonCoordQuery, ExactMerge, FragmentTable, IndexWidth,
    RepeatBuilder, StoreOptions,
};
use std::io::Cursor;
use tempfile::NamedTempFile;

const UNIT_LEN: usize = 200;

fn random_bases(len: usize, seed: &mut u64) -> Vec<u8> {
    (0..len)
        .map(|_| {
            *seed = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            b"ACGT"[((*seed >> 33) % 4) as usize]
        })
        .collect()
}

/// Two chromosomes carrying five copies of one unit between distinct flanks.
/// Returns the sequences and the (chromosome, local offset) of every copy.
fn synthetic_genome() -> (Vec<(String, Vec<u8>)>, Vec<(usize, u64)>) {
    let mut seed = 17u64;
    let unit = random_bases(UNIT_LEN, &mut seed);
    let flanks = [(b'A', b'C'), (b'C', b'G'), (b'G', b'T'), (b'T', b'A'), (b'A', b'C')];
    let layout: [(usize, &[usize]); 2] = [(0, &[1000, 500, 300]), (1, &[200, 400, 400, 100])];

    let mut copies = Vec::new();
    let mut sequences = Vec::new();
    let mut flank = flanks.iter();
    for (chrom, spacers) in layout {
        let mut seq = Vec::new();
        for (i, &spacer) in spacers.iter().enumerate() {
            seq.extend(random_bases(spacer, &mut seed));
            if chrom == 1 && i == 1 {
                seq.extend_from_slice(b"NNNNNNNN");
            }
            if i + 1 == spacers.len() {
                break;
            }
            let (before, after) = *flank.next().unwrap();
            seq.push(before);
            copies.push((chrom, seq.len() as u64));
            seq.extend_from_slice(&unit);
            seq.push(after);
        }
        sequences.push((format!("chr{}", chrom + 1), seq));
    }
    (sequences, copies)
}

fn build_params() -> BuildParams {
    BuildParams {
        min_repeat_len: 100,
        min_repeat_count: 5,
        grouping: false,
        max_edit: 0,
    }
}

#[test]
fn build_finds_all_copies() {
    let (sequences, copies) = synthetic_genome();
    assert_eq!(copies.len(), 5);

    let joined = join_sequences(&sequences);
    let table = FragmentTable::from_records(&joined.records, &joined.names);
    let sa = naive_suffix_array(&joined.text);

    let mut builder = RepeatBuilder::new(&joined.text, &table).expect("builder");
    builder
        .build(sa, &build_params(), &ExactMerge)
        .expect("build repeat groups");

    let groups = builder.groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].seq.len(), UNIT_LEN);
    assert_eq!(groups[0].positions.len(), 5);
    assert_eq!(builder.mask().masked_len(), 5 * UNIT_LEN);

    let mut summary = Vec::new();
    builder.write_repeat_groups(&mut summary).unwrap();
    let summary = String::from_utf8(summary).unwrap();
    for (chrom, off) in &copies {
        assert!(summary.contains(&format!("chr{}:{}", chrom + 1, off)));
    }
}

#[test]
fn built_database_survives_file_roundtrip_and_resolves() {
    let (sequences, copies) = synthetic_genome();
    let joined = join_sequences(&sequences);
    let table = FragmentTable::from_records(&joined.records, &joined.names);
    let sa = naive_suffix_array(&joined.text);

    let mut builder = RepeatBuilder::new(&joined.text, &table).unwrap();
    builder.build(sa, &build_params(), &ExactMerge).unwrap();

    let options = StoreOptions::new(IndexWidth::U32, true);
    let file = NamedTempFile::new().expect("create temp db");
    {
        let mut out = std::fs::File::create(file.path()).unwrap();
        builder.save(&mut out, options).expect("save");
    }

    let loaded = load_from_file(file.path(), options).expect("load");
    assert_eq!(loaded, builder.to_repeat_db());

    let resolved = loaded.construct(&table.segments()).expect("construct");
    let resolved_coords: Vec<(usize, u64)> = resolved.repeats()[0].alleles[0]
        .positions
        .iter()
        .map(|p| (p.tid as usize, p.toff))
        .collect();
    assert_eq!(resolved_coords, copies);

    // every copy pairs with itself at the family's first base
    let mut out = Vec::new();
    let query = CommonCoordQuery::new(0, 10, 0, 10).with_distance(0);
    assert!(resolved
        .find_common_coords(&query, &AltDb::default(), &mut out)
        .unwrap());
    assert_eq!(out.len(), 5);
    assert!(out.iter().all(|p| p.first == p.second));
}

#[test]
fn roundtrip_all_store_layouts() {
    let (sequences, _) = synthetic_genome();
    let joined = join_sequences(&sequences);
    let table = FragmentTable::from_records(&joined.records, &joined.names);
    let sa = naive_suffix_array(&joined.text);
    let mut builder = RepeatBuilder::new(&joined.text, &table).unwrap();
    builder.build(sa, &build_params(), &ExactMerge).unwrap();
    let db = builder.to_repeat_db();

    for width in [IndexWidth::U32, IndexWidth::U64] {
        for big_endian in [false, true] {
            let options = StoreOptions::new(width, big_endian);
            let mut buf = Vec::new();
            write_repeat_db(&mut buf, &db, options).unwrap();
            let back = read_repeat_db(&mut Cursor::new(buf), options).unwrap();
            assert_eq!(back, db, "{:?}", options);
        }
    }
}

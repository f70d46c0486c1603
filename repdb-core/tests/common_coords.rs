use repdb_core::{
    AltDb, CommonCoordQuery, CoordPair, Repeat, RepeatAllele, RepeatCoord, RepeatDb, Segment,
};

/// chr1 is 1000 bases and chr2 2000; family X occurs at joined offsets 50
/// and 1200, family Y at 60 and 1210.
fn two_chromosome_db() -> repdb_core::ResolvedRepeatDb {
    let coords = |offsets: &[u64]| -> Vec<RepeatCoord> {
        offsets.iter().map(|&o| RepeatCoord::joined(o, true)).collect()
    };

    let mut x = Repeat::new("rpt_0", 0, 0, 100);
    x.alleles
        .push(RepeatAllele::without_variants(0, coords(&[50, 1200])));
    let mut y = Repeat::new("rpt_1", 1, 100, 100);
    y.alleles
        .push(RepeatAllele::without_variants(0, coords(&[60, 1210])));

    let segments = [Segment::new(0, 0, 0), Segment::new(1000, 1, 0)];
    RepeatDb::from_repeats(vec![x, y])
        .construct(&segments)
        .expect("construct")
}

fn pairs(out: &[CoordPair]) -> Vec<(u64, u64)> {
    out.iter()
        .map(|p| (p.first.joined_off, p.second.joined_off))
        .collect()
}

#[test]
fn occurrences_resolve_to_their_chromosome() {
    let db = two_chromosome_db();
    let positions = &db.repeats()[0].alleles[0].positions;
    assert_eq!((positions[0].tid, positions[0].toff), (0, 50));
    assert_eq!((positions[1].tid, positions[1].toff), (1, 200));
}

#[test]
fn nearby_occurrences_pair_across_families() {
    let db = two_chromosome_db();
    let alts = AltDb::default();
    let mut out = Vec::new();

    let query = CommonCoordQuery::new(0, 10, 100, 110).with_distance(20);
    assert!(db.find_common_coords(&query, &alts, &mut out).unwrap());

    let found = pairs(&out);
    assert!(found.contains(&(50, 60)));
    assert!(found.contains(&(1200, 1210)));
    assert!(!found.contains(&(50, 1210)));
    assert_eq!(found.len(), 2);
}

#[test]
fn family_pairs_with_itself() {
    let db = two_chromosome_db();
    let mut out = Vec::new();
    let query = CommonCoordQuery::new(0, 10, 0, 10).with_distance(20);
    assert!(db
        .find_common_coords(&query, &AltDb::default(), &mut out)
        .unwrap());
    assert_eq!(pairs(&out), vec![(50, 50), (1200, 1200)]);
}

#[test]
fn distant_occurrences_do_not_pair() {
    let db = two_chromosome_db();
    let mut out = Vec::new();
    let query = CommonCoordQuery::new(0, 10, 100, 110).with_distance(5);
    assert!(!db
        .find_common_coords(&query, &AltDb::default(), &mut out)
        .unwrap());
    assert!(out.is_empty());
}

#[test]
fn concurrent_queries_share_the_database() {
    let db = two_chromosome_db();
    let alts = AltDb::default();

    std::thread::scope(|s| {
        for shift in 0..4u64 {
            let db = &db;
            let alts = &alts;
            s.spawn(move || {
                let mut out = Vec::new();
                let query = CommonCoordQuery::new(shift, 10, 100 + shift, 110).with_distance(20);
                assert!(db.find_common_coords(&query, alts, &mut out).unwrap());
                assert_eq!(
                    pairs(&out),
                    vec![(50 + shift, 60 + shift), (1200 + shift, 1210 + shift)]
                );
            });
        }
    });
}

/// One family whose two alleles occur at {50, 1200} and {60, 1210}, queried
/// against itself.
#[test]
fn family_with_two_alleles_pairs_across_its_alleles() {
    let mut x = Repeat::new("rpt_0", 0, 0, 100);
    x.alleles.push(RepeatAllele::without_variants(
        0,
        vec![RepeatCoord::joined(50, true), RepeatCoord::joined(1200, true)],
    ));
    x.alleles.push(RepeatAllele::without_variants(
        1,
        vec![RepeatCoord::joined(60, true), RepeatCoord::joined(1210, true)],
    ));
    let segments = [Segment::new(0, 0, 0), Segment::new(1000, 1, 0)];
    let db = RepeatDb::from_repeats(vec![x])
        .construct(&segments)
        .expect("construct");

    let second_allele = &db.repeats()[0].alleles[0].positions[1];
    assert_eq!(second_allele.joined_off, 1200);
    assert_eq!((second_allele.tid, second_allele.toff), (1, 200));

    let mut out = Vec::new();
    let query = CommonCoordQuery::new(0, 10, 0, 10).with_distance(20);
    assert!(db
        .find_common_coords(&query, &AltDb::default(), &mut out)
        .unwrap());

    let found = pairs(&out);
    assert!(found.contains(&(50, 60)));
    assert!(found.contains(&(1200, 1210)));
    assert!(!found.contains(&(50, 1210)));
    assert_eq!(found.len(), 8);
}

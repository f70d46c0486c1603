use proptest::prelude::*;
use repdb_core::{Repeat, RepeatAllele, RepeatCoord, RepeatDb, Segment};

fn families(lengths: &[u64]) -> RepeatDb {
    let mut pos = 0;
    let repeats = lengths
        .iter()
        .enumerate()
        .map(|(idx, &len)| {
            let mut repeat = Repeat::new(format!("rpt_{}", idx), idx as u64, pos, len);
            repeat
                .alleles
                .push(RepeatAllele::without_variants(0, vec![RepeatCoord::joined(0, true)]));
            pos += len;
            repeat
        })
        .collect();
    RepeatDb::from_repeats(repeats)
}

proptest! {
    #[test]
    fn every_offset_maps_to_its_family(
        lengths in proptest::collection::vec(1u64..40, 1..20),
    ) {
        let db = families(&lengths)
            .construct(&[Segment::new(0, 0, 0)])
            .expect("construct");

        for repeat in db.repeats() {
            for offset in repeat.pos..repeat.end() {
                let (found, local) = db.find_repeat(offset).expect("offset inside a family");
                prop_assert_eq!(found.id, repeat.id);
                prop_assert_eq!(local, offset - repeat.pos);
            }
        }
        prop_assert!(db.find_repeat(db.repeat_len()).is_err());
    }

    #[test]
    fn construct_places_every_position(
        chrom_lens in proptest::collection::vec(1u64..500, 1..6),
        picks in proptest::collection::vec(any::<u64>(), 1..60),
    ) {
        let mut segments = Vec::new();
        let mut start = 0;
        for (seq_id, &len) in chrom_lens.iter().enumerate() {
            segments.push(Segment::new(start, seq_id as u64, 0));
            start += len;
        }
        let total = start;

        let mut offsets: Vec<u64> = picks.iter().map(|p| p % total).collect();
        offsets.sort_unstable();
        let split = offsets.len() / 2;

        let mut repeat = Repeat::new("rpt_0", 0, 0, 10);
        for (allele_id, chunk) in [&offsets[..split], &offsets[split..]].iter().enumerate() {
            let positions = chunk.iter().map(|&o| RepeatCoord::joined(o, true)).collect();
            repeat
                .alleles
                .push(RepeatAllele::without_variants(allele_id as u64, positions));
        }

        let db = RepeatDb::from_repeats(vec![repeat]).construct(&segments).expect("construct");
        let resolved: Vec<&RepeatCoord> = db.repeats()[0]
            .alleles
            .iter()
            .flat_map(|a| a.positions.iter())
            .collect();
        prop_assert_eq!(resolved.len(), offsets.len());

        for (coord, &off) in resolved.iter().zip(&offsets) {
            prop_assert_eq!(coord.joined_off, off);
            let seg = segments
                .iter()
                .rposition(|s| s.joined_start <= off)
                .expect("segment");
            prop_assert_eq!(coord.tid, segments[seg].seq_id);
            prop_assert_eq!(coord.toff, off - segments[seg].joined_start);
        }
    }

    #[test]
    fn empty_query_matches_alleles_without_variants_in_window(
        snp_ids in proptest::collection::btree_set(0u64..100, 0..10),
        start in 0u64..100,
        width in 0u64..30,
    ) {
        let snp_ids: Vec<u64> = snp_ids.into_iter().collect();
        let allele = RepeatAllele::new(0, snp_ids.clone(), Vec::new()).expect("sorted ids");
        let window = start..start + width;
        let expected = !snp_ids.iter().any(|id| window.contains(id));
        prop_assert_eq!(allele.compatible(&[], &window), expected);
    }
}

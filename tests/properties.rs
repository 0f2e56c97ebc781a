//! Property-based tests (proptest) over small random relations: value
//! range, monotonicity under attribute extension, reorder invariance, and
//! agreement between engines.

use std::io::Write;

use proptest::prelude::*;

use entropy_miner::attribute_set::AttributeSet;
use entropy_miner::engines::buc::BucVariant;
use entropy_miner::engines::{compute_entropies, EngineKind};
use entropy_miner::tuple_store::memory::MemoryStore;
use entropy_miner::tuple_store::TupleStore;

/// Small random relation: `n` rows, `k` columns, each cell drawn from a
/// tiny alphabet so non-trivial equivalence classes actually occur.
fn small_relation() -> impl Strategy<Value = (Vec<Vec<u8>>, usize)> {
    (2usize..=5, 4usize..=40).prop_flat_map(|(k, n)| {
        prop::collection::vec(prop::collection::vec(0u8..4, k), n).prop_map(move |rows| (rows, k))
    })
}

fn load(rows: &[Vec<u8>], k: usize) -> (MemoryStore, entropy_miner::tuple_store::TableHandle, usize) {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for row in rows {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(file, "{}", line.join(",")).unwrap();
    }
    let mut store = MemoryStore::new();
    let (rel, n) = store.load(file.path(), k).unwrap();
    (store, rel, n)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn entropy_stays_within_zero_and_log2_n((rows, k) in small_relation()) {
        let (mut store, rel, n) = load(&rows, k);
        let map = compute_entropies(&mut store, rel, k, n, EngineKind::TidCnt, false).unwrap();
        let log_n = (n as f64).log2();
        for (_, v) in map.iter() {
            prop_assert!(*v >= -1e-9 && *v <= log_n + 1e-9, "H out of range: {v} (log n = {log_n})");
        }
    }

    #[test]
    fn entropy_is_monotone_under_attribute_extension((rows, k) in small_relation()) {
        let (mut store, rel, n) = load(&rows, k);
        let map = compute_entropies(&mut store, rel, k, n, EngineKind::TidCnt, false).unwrap();
        let log_n = (n as f64).log2();
        for bits in 1u64..(1u64 << k) {
            let s = AttributeSet::from_bits(bits);
            let h_s = map.get(&s).unwrap_or(log_n);
            for j in 0..k {
                if !s.contains(j) {
                    let s_ext = s.with(j);
                    let h_ext = map.get(&s_ext).unwrap_or(log_n);
                    prop_assert!(h_s <= h_ext + 1e-9, "monotonicity violated: H({s:?})={h_s} > H({s_ext:?})={h_ext}");
                }
            }
        }
    }

    #[test]
    fn entropy_is_invariant_under_column_reorder((rows, k) in small_relation()) {
        let (mut store_plain, rel_plain, n) = load(&rows, k);
        let plain = compute_entropies(&mut store_plain, rel_plain, k, n, EngineKind::TidCnt, false).unwrap();

        let (mut store_reordered, rel_reordered, _) = load(&rows, k);
        let reordered = compute_entropies(&mut store_reordered, rel_reordered, k, n, EngineKind::TidCnt, true).unwrap();

        let log_n = (n as f64).log2();
        for bits in 1u64..(1u64 << k) {
            let s = AttributeSet::from_bits(bits);
            let a = plain.get(&s).unwrap_or(log_n);
            let b = reordered.get(&s).unwrap_or(log_n);
            prop_assert!((a - b).abs() < 1e-9, "reorder changed H({s:?}): {a} vs {b}");
        }
    }

    #[test]
    fn all_engines_agree_on_random_relations((rows, k) in small_relation()) {
        let (mut store_t, rel_t, n) = load(&rows, k);
        let tidcnt = compute_entropies(&mut store_t, rel_t, k, n, EngineKind::TidCnt, false).unwrap();

        let (mut store_b, rel_b, _) = load(&rows, k);
        let buc = compute_entropies(&mut store_b, rel_b, k, n, EngineKind::Buc(BucVariant::Filter), false).unwrap();

        let (mut store_m, rel_m, _) = load(&rows, k);
        let buc_mat = compute_entropies(&mut store_m, rel_m, k, n, EngineKind::Buc(BucVariant::Materialize), false).unwrap();

        let log_n = (n as f64).log2();
        for bits in 1u64..(1u64 << k) {
            let s = AttributeSet::from_bits(bits);
            let h_t = tidcnt.get(&s).unwrap_or(log_n);
            let h_b = buc.get(&s).unwrap_or(log_n);
            let h_m = buc_mat.get(&s).unwrap_or(log_n);
            prop_assert!((h_t - h_b).abs() < 1e-9, "tidcnt vs buc_filter mismatch on {s:?}: {h_t} vs {h_b}");
            prop_assert!((h_t - h_m).abs() < 1e-9, "tidcnt vs buc_materialize mismatch on {s:?}: {h_t} vs {h_m}");
        }
    }
}

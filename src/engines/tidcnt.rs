//! TID/CNT engine: bottom-up, level-wise builder over tuple-identifier
//! lists keyed by value-hash.

use std::collections::{HashMap, VecDeque};

use crate::attribute_set::AttributeSet;
use crate::entropy_map::EntropyMap;
use crate::error::{EntropyError, EntropyResult};
use crate::tuple_store::{TableHandle, TupleStore};

/// Compute `EntropyMap[S]` for every non-empty `S ⊆ {0..k}` whose
/// projection has at least one non-singleton class.
pub fn run<S: TupleStore>(
    store: &mut S,
    rel: TableHandle,
    k: usize,
    map: &mut EntropyMap,
) -> EntropyResult<()> {
    let mut tid_lists: HashMap<AttributeSet, TableHandle> = HashMap::new();
    let mut queue: VecDeque<(AttributeSet, usize)> = VecDeque::new();

    // Level-1 initialization: one TID-list per attribute.
    for i in 0..k {
        if let Some(tid_list) = store.build_tid_list(rel, i)? {
            let set = AttributeSet::singleton(i);
            if let Some(acc) = store.group_sum_clogc(tid_list, &[0], None)? {
                map.set(set, acc);
            }
            tid_lists.insert(set, tid_list);
            queue.push_back((set, i));
        }
        // Otherwise column i is all-distinct: omitted entirely, no
        // TID-list, no queue entry. Every superset is unreachable and so
        // correctly never enumerated.
    }

    // Level extension: pop (S, last), try every j in (last, k-1].
    while let Some((s, last)) = queue.pop_front() {
        for j in (last + 1)..k {
            match extend_one(store, &mut tid_lists, s, j) {
                Ok(Some((s_prime, accumulator))) => {
                    map.set(s_prime, accumulator);
                    queue.push_back((s_prime, j));
                }
                Ok(None) => {}
                Err(EntropyError::ColumnOverlap { existing, attr }) => {
                    tracing::warn!(attrs = ?existing, col = attr, "column_overlap_in_tidcnt_extension");
                }
                Err(e) => return Err(e),
            }
        }
    }

    // Every surviving TID-list is dropped once the whole traversal is done.
    for (_, handle) in tid_lists {
        store.drop_table(handle)?;
    }

    Ok(())
}

/// One step of level extension. Requires TID-lists for both `S` and `{j}`
/// to exist; their absence is an automatic prune, not an error. Returns
/// `Some((S', accumulator))` when `S' = S ∪ {j}` was materialized, `None`
/// when pruned.
fn extend_one<S: TupleStore>(
    store: &mut S,
    tid_lists: &mut HashMap<AttributeSet, TableHandle>,
    s: AttributeSet,
    j: usize,
) -> EntropyResult<Option<(AttributeSet, f64)>> {
    if s.contains(j) {
        // The level-extension loop only ever calls this with j > s.max(),
        // so reaching here means a caller misused `extend_one` directly.
        return Err(EntropyError::ColumnOverlap { existing: s, attr: j });
    }

    let single = AttributeSet::singleton(j);
    let (Some(&tid_s), Some(&tid_j)) = (tid_lists.get(&s), tid_lists.get(&single)) else {
        return Ok(None); // no TID-list on either side: automatic prune
    };

    match store.hashed_join_counts(tid_s, tid_j)? {
        None => Ok(None),
        Some((cnt_tbl, accumulator)) => {
            let s_prime = s.union(&single);
            let joined = store.hashed_join_materialize(tid_s, tid_j, cnt_tbl)?;
            store.drop_table(cnt_tbl)?;
            tid_lists.insert(s_prime, joined);
            Ok(Some((s_prime, accumulator)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple_store::memory::MemoryStore;
    use std::io::Write;

    fn load(rows: &[&str], k: usize) -> (MemoryStore, TableHandle, usize) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        let mut store = MemoryStore::new();
        let (rel, n) = store.load(file.path(), k).unwrap();
        (store, rel, n)
    }

    #[test]
    fn extend_one_rejects_an_attribute_already_in_the_set() {
        let (mut store, rel, _n) = load(&["1,a", "1,a", "2,b", "2,b"], 2);
        let mut tid_lists = HashMap::new();
        tid_lists.insert(AttributeSet::singleton(0), store.build_tid_list(rel, 0).unwrap().unwrap());
        let err = extend_one(&mut store, &mut tid_lists, AttributeSet::singleton(0), 0).unwrap_err();
        assert!(matches!(err, EntropyError::ColumnOverlap { attr: 0, .. }));
    }

    #[test]
    fn all_distinct_column_has_max_entropy_and_is_not_extended() {
        let (mut store, rel, n) = load(&["1,a", "2,a", "3,b", "4,b", "5,c", "6,c"], 2);
        let mut map = EntropyMap::new();
        run(&mut store, rel, 2, &mut map).unwrap();
        map.finalize(n);
        let log6 = (n as f64).log2();
        assert!(map.get(&AttributeSet::singleton(0)).is_none()); // absent -> H = log2 n
        assert!((map.get(&AttributeSet::singleton(1)).unwrap() - (log6 - 1.0)).abs() < 1e-9);
        assert!(map.get(&AttributeSet::from_iter_indices([0, 1])).is_none());
    }

    #[test]
    fn functional_dependency_gives_equal_entropy_on_both_sides() {
        let (mut store, rel, n) = load(&["1,a", "1,a", "2,b", "2,b", "3,c", "3,c"], 2);
        let mut map = EntropyMap::new();
        run(&mut store, rel, 2, &mut map).unwrap();
        map.finalize(n);
        let expected = (n as f64).log2() - 1.0;
        for set in [
            AttributeSet::singleton(0),
            AttributeSet::singleton(1),
            AttributeSet::from_iter_indices([0, 1]),
        ] {
            assert!((map.get(&set).unwrap() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn extension_is_pruned_once_any_ancestor_has_no_shared_values() {
        let (mut store, rel, n) = load(&["a,a,a", "a,b,b", "b,c,c", "b,d,d"], 3);
        let mut map = EntropyMap::new();
        run(&mut store, rel, 3, &mut map).unwrap();
        map.finalize(n);
        // Only {0} has a non-singleton class; everything else is pruned
        // and must be absent, defaulting to log2(4) = 2.
        assert!((map.get(&AttributeSet::singleton(0)).unwrap() - 1.0).abs() < 1e-9);
        for set in [
            AttributeSet::singleton(1),
            AttributeSet::singleton(2),
            AttributeSet::from_iter_indices([0, 1]),
            AttributeSet::from_iter_indices([0, 2]),
            AttributeSet::from_iter_indices([1, 2]),
            AttributeSet::from_iter_indices([0, 1, 2]),
        ] {
            assert!(map.get(&set).is_none());
        }
    }
}

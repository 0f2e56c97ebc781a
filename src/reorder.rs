//! Column reorderer: most-distinct-first, to maximize prune rate in both
//! engines.

use crate::tuple_store::{StoreResult, TableHandle, TupleStore};

/// The physical→logical bijection produced by reordering: `rename[physical]
/// = logical`. Applied once, after finalization, to `EntropyMap` keys.
pub struct Reorder {
    /// `rename[physical_index] = original (logical) index`
    pub rename: Vec<usize>,
}

impl Reorder {
    /// Query `distinct_count` for every column, sort descending with
    /// stable tie-break on original index, then physically permute `rel`'s
    /// columns to match. Returns the bijection needed to map results back.
    pub fn compute_and_apply<S: TupleStore>(
        store: &mut S,
        rel: TableHandle,
        k: usize,
    ) -> StoreResult<Reorder> {
        let mut counts: Vec<(usize, usize)> = Vec::with_capacity(k);
        for col in 0..k {
            counts.push((col, store.distinct_count(rel, col)?));
        }
        // Stable sort descending on distinct count, ties broken by
        // original index (stable sort preserves original relative order).
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        let rename: Vec<usize> = counts.iter().map(|(col, _)| *col).collect();
        store.rename_columns(rel, &rename)?;
        Ok(Reorder { rename })
    }

    /// The identity reorder, useful when reordering is disabled. Purely a
    /// performance optimization; finalized entropies are identical either
    /// way.
    pub fn identity(k: usize) -> Reorder {
        Reorder { rename: (0..k).collect() }
    }
}

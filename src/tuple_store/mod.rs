//! The `TupleStore` seam.
//!
//! This is the *only* abstraction the engines (`crate::engines`) talk to.
//! CSV ingestion, SQL execution, result printing, and the relational
//! storage engine backing intermediate tables are all external
//! collaborators reached only through this trait; the engines never see
//! a backend's internals. Two implementations ship: [`memory::MemoryStore`]
//! (the default, in-process reference backend) and, behind the
//! `duckdb-backend` feature, [`duckdb_store::DuckDbStore`] (a real
//! SQL-backed implementation).

pub mod memory;
#[cfg(feature = "duckdb-backend")]
pub mod duckdb_store;

use std::path::Path;

use thiserror::Error;

use crate::value::Value;

/// Opaque handle to a table living inside a particular `TupleStore`
/// instance: the base relation, a TID-list, or an intermediate CNT/join
/// table. Handles are not valid across store instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableHandle(pub(crate) u64);

/// A conjunction of `column = value` equality predicates: the only filter
/// shape BUC's filter-based variant needs.
#[derive(Debug, Clone, Default)]
pub struct Filter(pub Vec<(usize, Value)>);

impl Filter {
    pub fn empty() -> Self {
        Filter(Vec::new())
    }

    #[must_use]
    pub fn and(&self, col: usize, value: Value) -> Self {
        let mut preds = self.0.clone();
        preds.push((col, value));
        Filter(preds)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unknown table handle")]
    UnknownTable,

    #[cfg(feature = "duckdb-backend")]
    #[error("duckdb error: {0}")]
    DuckDb(#[from] duckdb::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The group-and-count primitive surface the engines are built on. Every
/// call here is the only place blocking I/O may occur.
pub trait TupleStore {
    /// Ingest a headerless k-column tabular source, assigning TIDs
    /// 1..=n in file order. Returns a handle to the base relation and n.
    fn load(&mut self, path: &Path, k: usize) -> StoreResult<(TableHandle, usize)>;

    /// Number of distinct values in `col` of `rel`. Used by the column
    /// reorderer.
    fn distinct_count(&mut self, rel: TableHandle, col: usize) -> StoreResult<usize>;

    /// Permute the physical columns of `rel` in place according to
    /// `permutation`, where `permutation[new_index] = old_index`, renaming
    /// physical columns to col0..col_{k-1} in the new order.
    fn rename_columns(&mut self, rel: TableHandle, permutation: &[usize]) -> StoreResult<()>;

    /// Release a table created by this store. Must be safe to call on
    /// every exit path: success, prune, or error.
    fn drop_table(&mut self, tbl: TableHandle) -> StoreResult<()>;

    /// Level-1 initialization: dense-re-encode `col`'s raw values as keys
    /// `1..=d`, keep only `(key, tid)` pairs whose key has multiplicity ≥
    /// 2. Returns `None` when every value in the column is distinct; the
    /// singleton case is never materialized.
    fn build_tid_list(&mut self, rel: TableHandle, col: usize) -> StoreResult<Option<TableHandle>>;

    /// `Σ_g cnt(g)·log₂cnt(g)` over groups with `cnt > 1` on `cols`, under
    /// an optional conjunctive equality `filter`. `None` (⊥) when that
    /// group set is empty: not an error.
    fn group_sum_clogc(
        &mut self,
        rel: TableHandle,
        cols: &[usize],
        filter: Option<&Filter>,
    ) -> StoreResult<Option<f64>>;

    /// `(value-vector, count)` pairs with `count > 1` on `cols`, under an
    /// optional `filter`. Empty result permitted.
    fn group_values(
        &mut self,
        rel: TableHandle,
        cols: &[usize],
        filter: Option<&Filter>,
    ) -> StoreResult<Vec<(Vec<Value>, usize)>>;

    /// BUC materialized variant: project `rel EXCLUDE col WHERE col =
    /// value` into a fresh temporary table.
    fn materialize_partition(
        &mut self,
        rel: TableHandle,
        col: usize,
        value: &Value,
    ) -> StoreResult<TableHandle>;

    /// Row count of `rel`, used by the materialized BUC variant's
    /// `cnt = |rel restricted by f'|` step.
    fn row_count(&mut self, rel: TableHandle) -> StoreResult<usize>;

    /// TID/CNT's join primitive: a tid-equality inner join of two
    /// TID-lists grouped by `hash(val_a, val_b)`, keeping only groups with
    /// count ≥ 2. Returns `None` when that CNT table is empty (the prune
    /// signal); otherwise the surviving CNT table together with its
    /// already-computed `Σ cnt·log₂cnt`, bundled here since the CNT table
    /// is already grouped by construction and the caller always needs
    /// exactly this value right after the join.
    fn hashed_join_counts(
        &mut self,
        tid_a: TableHandle,
        tid_b: TableHandle,
    ) -> StoreResult<Option<(TableHandle, f64)>>;

    /// Expand a surviving CNT table back into `(val, tid)` rows, restricted
    /// to value-keys present in `counts`: the new TID-list for
    /// `S' = S ∪ {j}`.
    fn hashed_join_materialize(
        &mut self,
        tid_a: TableHandle,
        tid_b: TableHandle,
        counts: TableHandle,
    ) -> StoreResult<TableHandle>;
}

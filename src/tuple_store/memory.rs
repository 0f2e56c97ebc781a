//! In-process reference [`TupleStore`] implementation.
//!
//! Pure `HashMap`/`Vec` backed, no external process. The default backend,
//! used by the test suite and by anything that doesn't need a real SQL
//! engine. The relational storage engine behind intermediate tables is an
//! external collaborator the engines never look inside; this is one
//! concrete instance of it.

use std::collections::HashMap;
use std::path::Path;

use super::{Filter, StoreError, StoreResult, TableHandle, TupleStore};
use crate::storage::csv;
use crate::value::Value;
use crate::value_key::{DenseEncoder, ValueKey};

/// A single cell in a [`MemTable`] row. Base relations hold [`Cell::V`];
/// TID-lists and CNT tables hold `(Cell::K, Cell::N)` pairs (value-key,
/// tid-or-count).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Cell {
    V(Value),
    K(ValueKey),
    N(usize),
}

impl Cell {
    fn as_value(&self) -> Value {
        match self {
            Cell::V(v) => v.clone(),
            Cell::K(k) => Value::Int64(k.0 as i64),
            Cell::N(n) => Value::Int64(*n as i64),
        }
    }

    fn key(&self) -> ValueKey {
        match self {
            Cell::K(k) => *k,
            other => panic!("expected a ValueKey cell, found {other:?}"),
        }
    }

    fn num(&self) -> usize {
        match self {
            Cell::N(n) => *n,
            other => panic!("expected a numeric cell, found {other:?}"),
        }
    }
}

#[derive(Debug, Clone)]
struct MemTable {
    rows: Vec<Vec<Cell>>,
    ncols: usize,
}

impl MemTable {
    fn filtered_rows<'a>(&'a self, filter: Option<&'a Filter>) -> impl Iterator<Item = &'a Vec<Cell>> {
        self.rows.iter().filter(move |row| match filter {
            None => true,
            Some(f) => f.0.iter().all(|(col, val)| row[*col].as_value() == *val),
        })
    }
}

/// Reference, single-process [`TupleStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    arena: HashMap<u64, MemTable>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn insert(&mut self, table: MemTable) -> TableHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.arena.insert(id, table);
        TableHandle(id)
    }

    fn table(&self, handle: TableHandle) -> StoreResult<&MemTable> {
        self.arena.get(&handle.0).ok_or(StoreError::UnknownTable)
    }

    /// Group rows by `cols`, keeping only groups with multiplicity ≥ 2.
    /// Shared by `group_sum_clogc` and `group_values`.
    fn grouped(
        &self,
        rel: TableHandle,
        cols: &[usize],
        filter: Option<&Filter>,
    ) -> StoreResult<Vec<(Vec<Cell>, usize)>> {
        let table = self.table(rel)?;
        let mut groups: HashMap<Vec<Cell>, usize> = HashMap::new();
        for row in table.filtered_rows(filter) {
            let key: Vec<Cell> = cols.iter().map(|&c| row[c].clone()).collect();
            *groups.entry(key).or_insert(0) += 1;
        }
        Ok(groups.into_iter().filter(|(_, cnt)| *cnt > 1).collect())
    }
}

impl TupleStore for MemoryStore {
    fn load(&mut self, path: &Path, k: usize) -> StoreResult<(TableHandle, usize)> {
        let tuples = csv::load_headerless(path, k)?;
        let rows: Vec<Vec<Cell>> = tuples
            .into_iter()
            .map(|t| t.0.into_iter().map(Cell::V).collect())
            .collect();
        let n = rows.len();
        let handle = self.insert(MemTable { rows, ncols: k });
        Ok((handle, n))
    }

    fn distinct_count(&mut self, rel: TableHandle, col: usize) -> StoreResult<usize> {
        let table = self.table(rel)?;
        let mut seen: std::collections::HashSet<Value> = std::collections::HashSet::new();
        for row in &table.rows {
            seen.insert(row[col].as_value());
        }
        Ok(seen.len())
    }

    fn rename_columns(&mut self, rel: TableHandle, permutation: &[usize]) -> StoreResult<()> {
        let table = self.arena.get_mut(&rel.0).ok_or(StoreError::UnknownTable)?;
        for row in &mut table.rows {
            let reordered: Vec<Cell> = permutation.iter().map(|&old| row[old].clone()).collect();
            *row = reordered;
        }
        Ok(())
    }

    fn drop_table(&mut self, tbl: TableHandle) -> StoreResult<()> {
        self.arena.remove(&tbl.0);
        Ok(())
    }

    fn build_tid_list(&mut self, rel: TableHandle, col: usize) -> StoreResult<Option<TableHandle>> {
        let table = self.table(rel)?;
        let mut encoder = DenseEncoder::new();
        let mut groups: HashMap<ValueKey, Vec<usize>> = HashMap::new();
        for (idx, row) in table.rows.iter().enumerate() {
            let value = row[col].as_value();
            let key = encoder.encode(&value);
            groups.entry(key).or_default().push(idx + 1);
        }

        let mut rows = Vec::new();
        for (key, tids) in groups {
            if tids.len() > 1 {
                for tid in tids {
                    rows.push(vec![Cell::K(key), Cell::N(tid)]);
                }
            }
        }

        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.insert(MemTable { rows, ncols: 2 })))
    }

    fn group_sum_clogc(
        &mut self,
        rel: TableHandle,
        cols: &[usize],
        filter: Option<&Filter>,
    ) -> StoreResult<Option<f64>> {
        let groups = self.grouped(rel, cols, filter)?;
        if groups.is_empty() {
            return Ok(None);
        }
        let sum = groups
            .iter()
            .map(|(_, cnt)| {
                let c = *cnt as f64;
                c * c.log2()
            })
            .sum();
        Ok(Some(sum))
    }

    fn group_values(
        &mut self,
        rel: TableHandle,
        cols: &[usize],
        filter: Option<&Filter>,
    ) -> StoreResult<Vec<(Vec<Value>, usize)>> {
        let groups = self.grouped(rel, cols, filter)?;
        Ok(groups
            .into_iter()
            .map(|(key, cnt)| (key.iter().map(Cell::as_value).collect(), cnt))
            .collect())
    }

    fn materialize_partition(
        &mut self,
        rel: TableHandle,
        col: usize,
        value: &Value,
    ) -> StoreResult<TableHandle> {
        let table = self.table(rel)?;
        let rows: Vec<Vec<Cell>> = table
            .rows
            .iter()
            .filter(|row| row[col].as_value() == *value)
            .map(|row| {
                row.iter()
                    .enumerate()
                    .filter(|(i, _)| *i != col)
                    .map(|(_, c)| c.clone())
                    .collect()
            })
            .collect();
        let ncols = table.ncols - 1;
        Ok(self.insert(MemTable { rows, ncols }))
    }

    fn row_count(&mut self, rel: TableHandle) -> StoreResult<usize> {
        Ok(self.table(rel)?.rows.len())
    }

    fn hashed_join_counts(
        &mut self,
        tid_a: TableHandle,
        tid_b: TableHandle,
    ) -> StoreResult<Option<(TableHandle, f64)>> {
        let (groups, _) = self.join_groups(tid_a, tid_b)?;
        let surviving: Vec<(ValueKey, usize)> =
            groups.into_iter().filter(|(_, cnt)| *cnt > 1).collect();
        if surviving.is_empty() {
            return Ok(None);
        }
        let sum: f64 = surviving
            .iter()
            .map(|(_, cnt)| {
                let c = *cnt as f64;
                c * c.log2()
            })
            .sum();
        let rows = surviving
            .into_iter()
            .map(|(key, cnt)| vec![Cell::K(key), Cell::N(cnt)])
            .collect();
        let handle = self.insert(MemTable { rows, ncols: 2 });
        Ok(Some((handle, sum)))
    }

    fn hashed_join_materialize(
        &mut self,
        tid_a: TableHandle,
        tid_b: TableHandle,
        counts: TableHandle,
    ) -> StoreResult<TableHandle> {
        let surviving: std::collections::HashSet<ValueKey> = self
            .table(counts)?
            .rows
            .iter()
            .map(|row| row[0].key())
            .collect();

        let (_, per_tid) = self.join_groups(tid_a, tid_b)?;
        let rows = per_tid
            .into_iter()
            .filter(|(_, key)| surviving.contains(key))
            .map(|(tid, key)| vec![Cell::K(key), Cell::N(tid)])
            .collect();
        Ok(self.insert(MemTable { rows, ncols: 2 }))
    }
}

impl MemoryStore {
    /// Tid-equality inner join of two TID-lists: returns the per-composite-key
    /// group counts and, separately, the per-tid composite key (needed to
    /// rebuild the joined TID-list after filtering to surviving keys).
    fn join_groups(
        &self,
        tid_a: TableHandle,
        tid_b: TableHandle,
    ) -> StoreResult<(HashMap<ValueKey, usize>, Vec<(usize, ValueKey)>)> {
        let a = self.table(tid_a)?;
        let b = self.table(tid_b)?;

        let mut by_tid_b: HashMap<usize, ValueKey> = HashMap::new();
        for row in &b.rows {
            by_tid_b.insert(row[1].num(), row[0].key());
        }

        let mut groups: HashMap<ValueKey, usize> = HashMap::new();
        let mut per_tid = Vec::new();
        for row in &a.rows {
            let tid = row[1].num();
            if let Some(&val_b) = by_tid_b.get(&tid) {
                let val_a = row[0].key();
                let composite = ValueKey::combine(val_a, val_b);
                *groups.entry(composite).or_insert(0) += 1;
                per_tid.push((tid, composite));
            }
        }
        Ok((groups, per_tid))
    }
}

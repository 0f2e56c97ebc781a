//! A real SQL-backed [`TupleStore`], gated behind the `duckdb-backend`
//! feature.
//!
//! Values are hashed with DuckDB's built-in `HASH()` for composite joins,
//! CNT tables are built with `GROUP BY ... HAVING COUNT(*) > 1`, and
//! temporary tables are named from a monotonic counter, enough to
//! disambiguate recursion depth since every table this store creates gets
//! its own [`TableHandle`].
//!
//! Every attribute column is stored as `VARCHAR`, holding a tagged textual
//! encoding of [`Value`] (see [`encode_value`]/[`decode_value`]) so a
//! single schema shape works regardless of the column's inferred type:
//! entropy only cares about value *equality*, never about numeric
//! comparison.

use std::path::Path;

use duckdb::{Connection, Row};

use super::{Filter, StoreResult, TableHandle, TupleStore};
use crate::storage::csv;
use crate::value::Value;

pub struct DuckDbStore {
    conn: Connection,
    next_id: u64,
}

impl DuckDbStore {
    pub fn new() -> StoreResult<Self> {
        Ok(DuckDbStore { conn: Connection::open_in_memory()?, next_id: 0 })
    }

    fn fresh_table(&mut self) -> TableHandle {
        let id = self.next_id;
        self.next_id += 1;
        TableHandle(id)
    }

    fn name(handle: TableHandle) -> String {
        format!("et_{}", handle.0)
    }

    fn drop_if_exists(&self, handle: TableHandle) -> StoreResult<()> {
        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS {};", Self::name(handle)))?;
        Ok(())
    }

    fn where_clause(filter: Option<&Filter>) -> String {
        match filter {
            None => String::new(),
            Some(f) if f.is_empty() => String::new(),
            Some(f) => {
                let preds: Vec<String> = f
                    .0
                    .iter()
                    .map(|(col, val)| format!("col{col} = '{}'", encode_value(val)))
                    .collect();
                format!("WHERE {}", preds.join(" AND "))
            }
        }
    }
}

/// Tag-prefixed textual encoding: preserves the distinction between e.g.
/// the int `1` and the string `"1"` under plain `VARCHAR` equality.
fn encode_value(v: &Value) -> String {
    match v {
        Value::Int64(i) => format!("i:{i}"),
        Value::Float64(f) => format!("f:{f}"),
        Value::Bool(b) => format!("b:{b}"),
        Value::String(s) => format!("s:{s}"),
        Value::Null => "n:".to_string(),
    }
    .replace('\'', "''")
}

fn decode_value(raw: &str) -> Value {
    let (tag, rest) = raw.split_at(2.min(raw.len()));
    match tag {
        "i:" => rest.parse().map(Value::Int64).unwrap_or(Value::Null),
        "f:" => rest.parse().map(Value::Float64).unwrap_or(Value::Null),
        "b:" => match rest {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::Null,
        },
        "s:" => Value::String(rest.into()),
        _ => Value::Null,
    }
}

fn row_val(row: &Row, idx: usize) -> duckdb::Result<String> {
    row.get::<usize, String>(idx)
}

impl TupleStore for DuckDbStore {
    fn load(&mut self, path: &Path, k: usize) -> StoreResult<(TableHandle, usize)> {
        let tuples = csv::load_headerless(path, k)?;
        let handle = self.fresh_table();
        let name = Self::name(handle);

        let cols: Vec<String> = (0..k).map(|i| format!("col{i} VARCHAR")).collect();
        self.conn
            .execute_batch(&format!("CREATE TABLE {name} (tid BIGINT, {});", cols.join(", ")))?;

        let mut appender = self.conn.appender(&name)?;
        for (idx, tuple) in tuples.iter().enumerate() {
            let tid = (idx + 1) as i64;
            let mut row: Vec<String> = vec![tid.to_string()];
            row.extend(tuple.0.iter().map(encode_value));
            let refs: Vec<&str> = row.iter().map(String::as_str).collect();
            appender.append_row(refs.as_slice())?;
        }
        appender.flush()?;

        Ok((handle, tuples.len()))
    }

    fn distinct_count(&mut self, rel: TableHandle, col: usize) -> StoreResult<usize> {
        let n: i64 = self.conn.query_row(
            &format!("SELECT COUNT(DISTINCT col{col}) FROM {}", Self::name(rel)),
            [],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    fn rename_columns(&mut self, rel: TableHandle, permutation: &[usize]) -> StoreResult<()> {
        let name = Self::name(rel);
        let tmp = format!("{name}_tmp");
        let select: Vec<String> = permutation
            .iter()
            .enumerate()
            .map(|(new_idx, &old_idx)| format!("col{old_idx} AS col{new_idx}"))
            .collect();
        self.conn.execute_batch(&format!(
            "CREATE TABLE {tmp} AS SELECT tid, {} FROM {name}; \
             DROP TABLE {name}; ALTER TABLE {tmp} RENAME TO {name};",
            select.join(", ")
        ))?;
        Ok(())
    }

    fn drop_table(&mut self, tbl: TableHandle) -> StoreResult<()> {
        self.drop_if_exists(tbl)
    }

    fn build_tid_list(&mut self, rel: TableHandle, col: usize) -> StoreResult<Option<TableHandle>> {
        let base = Self::name(rel);
        let handle = self.fresh_table();
        let name = Self::name(handle);

        self.conn.execute_batch(&format!(
            "CREATE TABLE {name} AS
             WITH counted AS (
                 SELECT col{col} AS v, tid,
                        COUNT(*) OVER (PARTITION BY col{col}) AS cnt
                 FROM {base}
             ),
             surviving AS (
                 SELECT v, MIN(tid) AS first_tid FROM counted WHERE cnt >= 2 GROUP BY v
             )
             SELECT DENSE_RANK() OVER (ORDER BY s.first_tid) AS val, c.tid AS tid
             FROM counted c JOIN surviving s ON c.v = s.v
             WHERE c.cnt >= 2;"
        ))?;

        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {name}"), [], |row| row.get(0))?;
        if n == 0 {
            self.drop_if_exists(handle)?;
            return Ok(None);
        }
        Ok(Some(handle))
    }

    fn group_sum_clogc(
        &mut self,
        rel: TableHandle,
        cols: &[usize],
        filter: Option<&Filter>,
    ) -> StoreResult<Option<f64>> {
        let base = Self::name(rel);
        let group_cols: Vec<String> = cols.iter().map(|c| format!("col{c}")).collect();
        let sql = format!(
            "SELECT SUM(cnt * LOG2(cnt)) FROM (
                 SELECT COUNT(*) AS cnt FROM {base} {}
                 GROUP BY {} HAVING COUNT(*) > 1
             ) t",
            Self::where_clause(filter),
            group_cols.join(", ")
        );
        let sum: Option<f64> = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(sum)
    }

    fn group_values(
        &mut self,
        rel: TableHandle,
        cols: &[usize],
        filter: Option<&Filter>,
    ) -> StoreResult<Vec<(Vec<Value>, usize)>> {
        let base = Self::name(rel);
        let select_cols: Vec<String> = cols.iter().map(|c| format!("col{c}")).collect();
        let sql = format!(
            "SELECT {}, COUNT(*) AS cnt FROM {base} {}
             GROUP BY {} HAVING COUNT(*) > 1",
            select_cols.join(", "),
            Self::where_clause(filter),
            select_cols.join(", ")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let ncols = cols.len();
        let rows = stmt.query_map([], move |row| {
            let values: duckdb::Result<Vec<String>> =
                (0..ncols).map(|i| row_val(row, i)).collect();
            let cnt: i64 = row.get(ncols)?;
            Ok((values?, cnt as usize))
        })?;

        let mut out = Vec::new();
        for r in rows {
            let (raw_values, cnt) = r?;
            out.push((raw_values.iter().map(|s| decode_value(s)).collect(), cnt));
        }
        Ok(out)
    }

    fn materialize_partition(
        &mut self,
        rel: TableHandle,
        col: usize,
        value: &Value,
    ) -> StoreResult<TableHandle> {
        let base = Self::name(rel);
        let handle = self.fresh_table();
        let name = Self::name(handle);

        // Project every column except `col`, renumbering to close the gap.
        let total_cols = self.column_count(rel)?;
        let remaining_cols: Vec<usize> = (0..total_cols).filter(|&c| c != col).collect();
        let select: Vec<String> = std::iter::once("tid".to_string())
            .chain(
                remaining_cols
                    .iter()
                    .enumerate()
                    .map(|(new_idx, &old_idx)| format!("col{old_idx} AS col{new_idx}")),
            )
            .collect();

        self.conn.execute_batch(&format!(
            "CREATE TABLE {name} AS SELECT {} FROM {base} WHERE col{col} = '{}';",
            select.join(", "),
            encode_value(value)
        ))?;

        Ok(handle)
    }

    fn row_count(&mut self, rel: TableHandle) -> StoreResult<usize> {
        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", Self::name(rel)), [], |row| row.get(0))?;
        Ok(n as usize)
    }

    fn hashed_join_counts(
        &mut self,
        tid_a: TableHandle,
        tid_b: TableHandle,
    ) -> StoreResult<Option<(TableHandle, f64)>> {
        let a = Self::name(tid_a);
        let b = Self::name(tid_b);
        let handle = self.fresh_table();
        let name = Self::name(handle);

        self.conn.execute_batch(&format!(
            "CREATE TABLE {name} AS
             SELECT HASH(a.val, b.val) AS val, COUNT(*) AS cnt
             FROM {a} a JOIN {b} b ON a.tid = b.tid
             GROUP BY HASH(a.val, b.val) HAVING COUNT(*) > 1;"
        ))?;

        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {name}"), [], |row| row.get(0))?;
        if n == 0 {
            self.drop_if_exists(handle)?;
            return Ok(None);
        }
        let sum: f64 = self.conn.query_row(
            &format!("SELECT SUM(cnt * LOG2(cnt)) FROM {name}"),
            [],
            |row| row.get(0),
        )?;
        Ok(Some((handle, sum)))
    }

    fn hashed_join_materialize(
        &mut self,
        tid_a: TableHandle,
        tid_b: TableHandle,
        counts: TableHandle,
    ) -> StoreResult<TableHandle> {
        let a = Self::name(tid_a);
        let b = Self::name(tid_b);
        let c = Self::name(counts);
        let handle = self.fresh_table();
        let name = Self::name(handle);

        self.conn.execute_batch(&format!(
            "CREATE TABLE {name} AS
             SELECT c.val AS val, a.tid AS tid
             FROM {a} a JOIN {b} b ON a.tid = b.tid
             JOIN {c} c ON HASH(a.val, b.val) = c.val;"
        ))?;

        Ok(handle)
    }
}

impl DuckDbStore {
    fn column_count(&self, rel: TableHandle) -> StoreResult<usize> {
        let name = Self::name(rel);
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM {name} LIMIT 0"))?;
        let rows = stmt.query([])?;
        let width = rows.as_ref().map_or(0, |s| s.column_count());
        // width includes the leading `tid` column.
        Ok(width.saturating_sub(1))
    }
}

//! Headerless CSV ingestion.
//!
//! CSV ingestion is an external collaborator, out of the engines' own
//! scope; they only ever see a [`crate::tuple_store::TupleStore`]. This
//! module is the ambient I/O glue both shipped backends use to implement
//! `TupleStore::load`: a path to a headerless tabular source with a fixed
//! number of textual columns.
//!
//! Parsing follows simple, hand-rolled quoting rules (delimiter, quote
//! char, escaped quotes) for the headerless case this crate needs.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::tuple_store::{StoreError, StoreResult};
use crate::value::{Tuple, Value};

/// Load a headerless `k`-column CSV file, assigning TIDs 1..=n in file
/// order (the assignment itself happens at the call site; this just
/// returns rows in file order).
pub fn load_headerless(path: &Path, k: usize) -> StoreResult<Vec<Tuple>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut tuples = Vec::new();
    for (line_no, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }
        let fields = parse_line(&line);
        if fields.len() != k {
            return Err(StoreError::Parse(format!(
                "row {} has {} fields, expected {k}",
                line_no + 1,
                fields.len()
            )));
        }
        let values: Vec<Value> = fields.iter().map(|f| Value::parse(f)).collect();
        tuples.push(Tuple::new(values));
    }
    Ok(tuples)
}

/// Split one CSV line into fields, honoring `"`-quoting with `""` as an
/// escaped quote.
fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '"' {
            if in_quotes && chars.get(i + 1) == Some(&'"') {
                current.push('"');
                i += 1;
            } else {
                in_quotes = !in_quotes;
            }
        } else if c == ',' && !in_quotes {
            fields.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(c);
        }
        i += 1;
    }
    fields.push(current.trim().to_string());
    fields
}

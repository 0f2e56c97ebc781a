//! Output rendering.
//!
//! Deliberately outside the core: the engines and [`crate::entropy_map`]
//! never format text. This module is ambient glue the driver binary calls
//! after [`crate::engines::compute_entropies`] returns.

use crate::attribute_set::AttributeSet;
use crate::entropy_map::EntropyMap;

/// Render one line per entry in `map`, in its natural (lexicographic)
/// iteration order: `Entropy for AttrSet{a0, a1, ...}: v`.
///
/// Absent subsets are not emitted here; they may be filled in by the
/// caller on demand, see [`render_all`] for that.
pub fn render_present(map: &EntropyMap) -> Vec<String> {
    map.iter().map(|(set, v)| render_line(set, *v)).collect()
}

/// Render every non-empty subset of `k` attributes, filling in `log₂ n`
/// for subsets absent from `map` (an absent subset means every value in
/// its projection is distinct, so its entropy is the maximum).
pub fn render_all(map: &EntropyMap, k: usize, n: usize) -> Vec<String> {
    let log_n = (n as f64).log2();
    let mut sets: Vec<AttributeSet> = (1u64..(1u64 << k)).map(AttributeSet::from_bits).collect();
    sets.sort();
    sets.iter()
        .map(|set| render_line(set, map.get(set).unwrap_or(log_n)))
        .collect()
}

fn render_line(set: &AttributeSet, value: f64) -> String {
    format!("Entropy for {set}: {value}")
}

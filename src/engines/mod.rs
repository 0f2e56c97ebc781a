//! The two entropy-computation engines and the driver that wires
//! reordering, engine choice, and finalization together.

pub mod buc;
pub mod tidcnt;

use crate::entropy_map::EntropyMap;
use crate::error::EntropyResult;
use crate::reorder::Reorder;
use crate::tuple_store::{TableHandle, TupleStore};

pub use buc::BucVariant;

/// Which engine to run. Both compute the same entropy values; they differ
/// only in how they traverse the attribute lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    TidCnt,
    Buc(BucVariant),
}

/// Run the chosen engine over `rel`, then finalize and (optionally) remap
/// accumulator keys back to the caller's original attribute numbering.
///
/// `rel` must already be loaded; this reorders columns (if requested),
/// dispatches to the engine, finalizes, and renames.
pub fn compute_entropies<S: TupleStore>(
    store: &mut S,
    rel: TableHandle,
    k: usize,
    n: usize,
    engine: EngineKind,
    reorder_columns: bool,
) -> EntropyResult<EntropyMap> {
    let reorder = if reorder_columns {
        Reorder::compute_and_apply(store, rel, k)?
    } else {
        Reorder::identity(k)
    };

    let mut map = EntropyMap::new();
    match engine {
        EngineKind::TidCnt => tidcnt::run(store, rel, k, &mut map)?,
        EngineKind::Buc(variant) => buc::run(store, rel, k, variant, &mut map)?,
    }

    map.finalize(n);
    Ok(map.renamed(&reorder.rename))
}

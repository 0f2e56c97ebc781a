//! Core error type.
//!
//! A `thiserror` enum at the library boundary (`tuple_store::StoreError`
//! wrapped and propagated), kept separate from the driver binary's
//! `anyhow` usage (see `src/bin/entropy_miner.rs`).

use thiserror::Error;

use crate::tuple_store::StoreError;

/// Fatal errors surfaced by the engines. Emptiness (⊥) from a group/join
/// primitive is *not* an error: it's the prune signal, and is represented
/// with `Option`, never with this type.
#[derive(Error, Debug)]
pub enum EntropyError {
    /// A `TupleStore` primitive failed. Fatal: unwind, dropping all scoped
    /// temporary tables.
    #[error("store primitive failed: {0}")]
    Store(#[from] StoreError),

    /// TID/CNT attempted to extend a subset `S` by an attribute already in
    /// `S`. Classified as a programmer error: diagnostic + skip, not a
    /// hard abort.
    #[error("attribute set {existing:?} already contains column {attr}")]
    ColumnOverlap { existing: crate::attribute_set::AttributeSet, attr: usize },
}

pub type EntropyResult<T> = Result<T, EntropyError>;

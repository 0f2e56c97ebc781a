//! # entropy-miner
//!
//! Empirical Shannon entropy of every attribute subset of a relation.
//!
//! Given a relation R with k attributes, this crate computes, for every
//! non-trivial subset S of attributes, the empirical entropy
//! `H(S) = log₂ n − (Σ_v c(v)·log₂ c(v)) / n` over the equivalence classes
//! `πS(R)` induces: a building block for functional-dependency discovery,
//! unique-column-combination search, and general schema profiling.
//!
//! ## Pipeline
//!
//! ```text
//! load (TupleStore::load)
//!     ↓
//! column reorder (most-distinct-first, optional)
//!     ↓
//! engine: TID/CNT (bottom-up, level-wise) or BUC (top-down partitioning)
//!     ↓
//! EntropyMap (raw Σc·log₂c accumulators)
//!     ↓
//! finalize (H(S) = log₂n − acc/n) + rename (physical → logical attributes)
//!     ↓
//! render
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use entropy_miner::{Config, engines::{compute_entropies}};
//! use entropy_miner::tuple_store::{TupleStore, memory::MemoryStore};
//!
//! let config = Config::load().unwrap_or_default();
//! let mut store = MemoryStore::new();
//! let (rel, n) = store.load("data.csv".as_ref(), 5)?;
//! let map = compute_entropies(&mut store, rel, 5, n, config.engine.resolve(), config.engine.reorder_columns)?;
//! for line in entropy_miner::render::render_present(&map) {
//!     println!("{line}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Backends: [`tuple_store::memory::MemoryStore`] ships unconditionally;
//! [`tuple_store::duckdb_store::DuckDbStore`] is available behind the
//! `duckdb-backend` feature for a real SQL-backed deployment. Both
//! implement the same [`tuple_store::TupleStore`] seam, so engines never
//! need to know which one they're driving.

pub mod attribute_set;
pub mod config;
pub mod engines;
pub mod entropy_map;
pub mod error;
pub mod render;
pub mod reorder;
pub mod storage;
pub mod tuple_store;
pub mod value;
pub mod value_key;

pub use config::Config;
pub use engines::{compute_entropies, BucVariant, EngineKind};
pub use entropy_map::EntropyMap;
pub use error::{EntropyError, EntropyResult};

//! Ambient I/O glue.
//!
//! CSV ingestion is an external collaborator the `TupleStore`
//! implementations reach for when asked to `load` a relation. The engines
//! never import this module directly.

pub mod csv;

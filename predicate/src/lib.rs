#![deny(missing_docs)]
//! Filter structures and predicate evaluation for geoplaces.
//!
//! This crate is Arrow-first: literals are plain scalars, columns are dotted
//! paths into a record batch, and evaluation follows Arrow semantics including
//! Kleene NULL handling. A [`FilterStructure`] is the user-facing form; it is
//! lowered into a [`Predicate`] tree that can be evaluated against any
//! [`arrow::record_batch::RecordBatch`] or pushed into a parquet row filter.

mod core;
mod error;
mod eval;
mod filter;

pub use self::core::{
    ColumnRef, ComparisonOp, Predicate, PredicateBuilder, PredicateNode, PredicateVisitor,
    ScalarValue,
};

pub use error::FilterError;
pub use eval::{evaluate, filter_batch, BatchEvaluator};
pub use filter::{FilterOp, FilterStructure, FilterValue, Triplet};

//! # parley-extract
//!
//! Turns arbitrary generator output into a validated record.
//!
//! The generator is not schema-constrained, so well-formed JSON is the happy
//! path and "any text resembling the schema" is the floor. The cascade in
//! [`extract`] tries progressively more aggressive repair strategies and ends
//! with schema defaults, so it never fails. A validation pass then coerces
//! every required field to the right shape. Correctness of the values is the
//! generator's problem; shape correctness is this crate's contract.

mod cascade;
mod schema;

pub use cascade::{extract, Extraction, Stage};
pub use schema::{FieldKind, FieldSpec, RecordSchema};

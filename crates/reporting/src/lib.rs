//! Weekly reporting domain: aggregate rows, carry-over replay, historical
//! imports.
//!
//! Everything here is pure computation over [`WeeklyAggregate`] rows. The
//! engine crate owns the storage those rows live in.

pub mod aggregate;
pub mod carryover;
pub mod import;

pub use aggregate::WeeklyAggregate;
pub use carryover::stock_before;
pub use import::{ImportReport, ImportRow, validate_batch};

//! `mailstock-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the error model, ISO calendar-week value types, and the document category
//! enumeration with its alias-driven resolver.

pub mod category;
pub mod error;
pub mod week;

pub use category::{Category, CategoryConfig};
pub use error::{DomainError, DomainResult};
pub use week::WeekId;

//! Item ledger domain module.
//!
//! This crate contains the per-item lifecycle rules, implemented purely as
//! deterministic domain logic (no IO, no storage). The engine crate owns
//! orchestration; everything here is a plain state transition that reports
//! whether it changed anything, which is what makes redundant deliveries
//! from independent producers safe to replay.

pub mod event;
pub mod item;

pub use event::{EventEnvelope, ItemEvent};
pub use item::{Disposition, Item, ItemId, StateChange};

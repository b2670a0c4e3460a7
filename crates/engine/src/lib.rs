//! Engine layer: storage, clock, and the facade that ties the ledger to the
//! weekly aggregates.
//!
//! The engine is an explicit object constructed with injected configuration,
//! an injected storage handle, and an injected clock; there is no ambient
//! mutable state anywhere in the workspace.

pub mod clock;
pub mod engine;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{Engine, EngineConfig, IngestOutcome};
pub use store::{MemoryStore, Tables};

//! In-memory storage for the ledger and the weekly aggregate table.
//!
//! Both tables live behind one lock, exposed through closure-scoped access.
//! Every engine operation runs inside a single `read`/`write` call, which is
//! what gives "apply event + recompute aggregates" its all-or-nothing
//! visibility: a concurrent reader sees either neither effect or both.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use mailstock_core::{Category, WeekId};
use mailstock_ledger::{Item, ItemId};
use mailstock_reporting::WeeklyAggregate;

/// The two logical tables plus the aggregate uniqueness constraint, realized
/// as map keys. `BTreeMap` keeps aggregate rows in (week, category) order,
/// so chronological replay is a plain iteration.
#[derive(Debug, Default)]
pub struct Tables {
    pub items: HashMap<ItemId, Item>,
    aggregates: BTreeMap<(WeekId, Category), WeeklyAggregate>,
}

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aggregate(&self, week: WeekId, category: Category) -> Option<&WeeklyAggregate> {
        self.aggregates.get(&(week, category))
    }

    /// Insert or replace a row, clamping ledger-derived counters on the way
    /// in. This is the only write path into the aggregate table.
    pub fn upsert_aggregate(&mut self, mut row: WeeklyAggregate) {
        row.clamp_counters();
        self.aggregates.insert((row.week, row.category), row);
    }

    /// All rows for one week, in category order.
    pub fn rows_for_week(&self, week: WeekId) -> Vec<WeeklyAggregate> {
        self.aggregates
            .iter()
            .filter(|((w, _), _)| *w == week)
            .map(|(_, row)| row.clone())
            .collect()
    }

    /// Every stored row, chronological.
    pub fn all_rows(&self) -> impl Iterator<Item = &WeeklyAggregate> {
        self.aggregates.values()
    }

    /// Categories that already have a row for `week`.
    pub fn categories_for_week(&self, week: WeekId) -> Vec<Category> {
        self.aggregates
            .keys()
            .filter(|(w, _)| *w == week)
            .map(|(_, category)| *category)
            .collect()
    }

    /// Distinct weeks with at least one row, most recent first.
    pub fn distinct_weeks_desc(&self) -> Vec<WeekId> {
        let mut weeks: Vec<WeekId> = self.aggregates.keys().map(|(week, _)| *week).collect();
        weeks.dedup();
        weeks.reverse();
        weeks
    }
}

/// Shared in-memory store: one lock over both tables.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a read-only closure over a consistent snapshot of both tables.
    pub fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Run a mutating closure as one atomic unit.
    pub fn write<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

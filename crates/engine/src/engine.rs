//! The engine facade: ledger reconciliation + weekly aggregation.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use mailstock_core::{Category, CategoryConfig, DomainError, DomainResult, WeekId};
use mailstock_ledger::{EventEnvelope, Item, ItemEvent, StateChange};
use mailstock_reporting::{ImportReport, ImportRow, WeeklyAggregate, stock_before, validate_batch};

use crate::clock::Clock;
use crate::store::{MemoryStore, Tables};

/// Injected policy and classification configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Location → category mapping.
    #[serde(default)]
    pub categories: CategoryConfig,
    /// When enabled, the first unread → read transition on an untreated item
    /// stamps its treated timestamp.
    #[serde(default)]
    pub read_as_treated: bool,
}

/// What happened to one ingested event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestOutcome {
    /// The event changed ledger state (and current-week aggregates were
    /// recomputed in the same critical section).
    Applied,
    /// The event repeated a change already applied; nothing was touched.
    Duplicate,
    /// A non-arrival event referenced an identity the ledger has never seen.
    /// Dropped and logged as a reconciliation gap; a later arrival event may
    /// still close it.
    DroppedUnknown,
}

/// Single owner of the ledger and the weekly aggregate table.
///
/// Multiple producers (bulk scan, live stream, reconciliation poll) may feed
/// [`Engine::ingest`] concurrently and redundantly; every operation is one
/// atomic critical section over the shared store and is idempotent, so any
/// of them can be retried freely.
pub struct Engine<C: Clock> {
    config: EngineConfig,
    store: Arc<MemoryStore>,
    clock: C,
}

impl<C: Clock> Engine<C> {
    pub fn new(config: EngineConfig, store: Arc<MemoryStore>, clock: C) -> Self {
        Self {
            config,
            store,
            clock,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Apply one inbound event and, if it changed the ledger, recompute the
    /// current week's aggregates within the same critical section.
    pub fn ingest(&self, envelope: &EventEnvelope) -> IngestOutcome {
        self.store.write(|tables| {
            let outcome = self.apply_event(tables, envelope);
            if outcome == IngestOutcome::Applied {
                let week = WeekId::of(self.clock.now());
                self.recompute_week(tables, week);
            }
            outcome
        })
    }

    /// Recompute the current week's received/treated counters from the
    /// ledger. Deterministic and idempotent: with no intervening mutation a
    /// second call stores identical values.
    pub fn recompute_current_week(&self) {
        let week = WeekId::of(self.clock.now());
        self.store.write(|tables| self.recompute_week(tables, week));
    }

    /// Add a signed out-of-band correction to one (week, category) row,
    /// creating the row if absent. Returns the stored row.
    pub fn adjust_manual(&self, week: WeekId, category: Category, delta: i64) -> WeeklyAggregate {
        let now = self.clock.now();
        self.store.write(|tables| {
            let mut row = tables
                .aggregate(week, category)
                .cloned()
                .unwrap_or_else(|| WeeklyAggregate::empty(week, category, now));
            row.manual_adjustment += delta;
            row.updated_at = now;
            tables.upsert_aggregate(row.clone());
            row
        })
    }

    /// All aggregate rows for one week, in category order.
    pub fn get_weekly_aggregate(&self, week: WeekId) -> Vec<WeeklyAggregate> {
        self.store.read(|tables| tables.rows_for_week(week))
    }

    /// One page of weekly history, paginated by distinct week, most recent
    /// week first. Rows within the page stay grouped per week.
    pub fn get_weekly_history_page(
        &self,
        page: usize,
        page_size: usize,
    ) -> DomainResult<Vec<WeeklyAggregate>> {
        if page_size == 0 {
            return Err(DomainError::validation("page_size must be positive"));
        }
        Ok(self.store.read(|tables| {
            tables
                .distinct_weeks_desc()
                .into_iter()
                .skip(page * page_size)
                .take(page_size)
                .flat_map(|week| tables.rows_for_week(week))
                .collect()
        }))
    }

    /// Recompute the current week and return its rows.
    pub fn get_current_week_snapshot(&self) -> Vec<WeeklyAggregate> {
        let week = WeekId::of(self.clock.now());
        self.store.write(|tables| {
            self.recompute_week(tables, week);
            tables.rows_for_week(week)
        })
    }

    /// Backlog per category immediately before the given week.
    pub fn stock_before(&self, year: i32, week: u32) -> DomainResult<BTreeMap<Category, i64>> {
        let target = WeekId::new(year, week)?;
        Ok(self
            .store
            .read(|tables| stock_before(tables.all_rows(), target)))
    }

    /// Seed or overwrite historical weeks directly, bypassing the ledger.
    ///
    /// Malformed rows are logged and skipped; the rest of the batch is
    /// written. Returns accepted/skipped counts.
    pub fn import_history(&self, rows: &[ImportRow]) -> ImportReport {
        let now = self.clock.now();
        let (accepted, report) = validate_batch(rows, now);
        self.store.write(|tables| {
            for row in accepted {
                tables.upsert_aggregate(row);
            }
        });
        debug!(
            accepted = report.accepted,
            skipped = report.skipped,
            "history import finished"
        );
        report
    }

    fn apply_event(&self, tables: &mut Tables, envelope: &EventEnvelope) -> IngestOutcome {
        match envelope.payload() {
            ItemEvent::ItemArrived {
                identity,
                location,
                timestamp,
                read,
            } => {
                let category = self.config.categories.resolve(location);
                match tables.items.entry(identity.clone()) {
                    Entry::Vacant(slot) => {
                        // The only path that grows a week's received count:
                        // arrival timestamp and week are fixed here forever.
                        slot.insert(Item::new(identity.clone(), category, *timestamp, *read));
                        debug!(item = %identity, %category, "item arrived");
                        IngestOutcome::Applied
                    }
                    Entry::Occupied(mut slot) => {
                        let item = slot.get_mut();
                        // Redundant arrival report: mutable fields may still
                        // move, arrival stays untouched.
                        let change = StateChange {
                            read: Some(*read),
                            category: Some(category),
                            treated: None,
                        };
                        self.changed_outcome(item.apply_change(
                            change,
                            envelope.observed_at(),
                            self.config.read_as_treated,
                        ))
                    }
                }
            }
            ItemEvent::ItemStateChanged {
                identity,
                read,
                location,
                treated,
            } => {
                let category = location
                    .as_deref()
                    .map(|l| self.config.categories.resolve(l));
                match tables.items.get_mut(identity) {
                    None => self.drop_unknown(envelope, identity.as_str()),
                    Some(item) => {
                        let change = StateChange {
                            read: *read,
                            category,
                            treated: *treated,
                        };
                        self.changed_outcome(item.apply_change(
                            change,
                            envelope.observed_at(),
                            self.config.read_as_treated,
                        ))
                    }
                }
            }
            ItemEvent::ItemDeleted {
                identity,
                timestamp,
            } => match tables.items.get_mut(identity) {
                None => self.drop_unknown(envelope, identity.as_str()),
                Some(item) => self.changed_outcome(item.apply_delete(*timestamp)),
            },
        }
    }

    fn changed_outcome(&self, changed: bool) -> IngestOutcome {
        if changed {
            IngestOutcome::Applied
        } else {
            IngestOutcome::Duplicate
        }
    }

    fn drop_unknown(&self, envelope: &EventEnvelope, identity: &str) -> IngestOutcome {
        // Event ordering across producers is not guaranteed; a later arrival
        // may still close this gap, so this is a warning, not an error.
        warn!(
            event_id = %envelope.event_id(),
            event_type = envelope.payload().event_type(),
            item = identity,
            "reconciliation gap: state change for unknown item dropped"
        );
        IngestOutcome::DroppedUnknown
    }

    /// Full rescan of the ledger for `week`.
    ///
    /// Recomputing from scratch (instead of bumping counters per event) is
    /// what keeps redundant reports from the independent producers from
    /// double-counting. Categories whose stored row no longer matches any
    /// item are rewritten with zero counts, not deleted; manual adjustments
    /// are preserved either way.
    fn recompute_week(&self, tables: &mut Tables, week: WeekId) {
        let mut received: BTreeMap<Category, i64> = BTreeMap::new();
        let mut treated: BTreeMap<Category, i64> = BTreeMap::new();

        for item in tables.items.values() {
            if item.arrival_week() == week {
                *received.entry(item.category()).or_insert(0) += 1;
            }
            if item.treated_week() == Some(week) {
                *treated.entry(item.category()).or_insert(0) += 1;
            }
        }

        let mut categories: BTreeSet<Category> = BTreeSet::new();
        categories.extend(received.keys().copied());
        categories.extend(treated.keys().copied());
        categories.extend(tables.categories_for_week(week));

        let now = self.clock.now();
        for category in categories {
            let new_received = received.get(&category).copied().unwrap_or(0);
            let new_treated = treated.get(&category).copied().unwrap_or(0);

            let mut row = tables
                .aggregate(week, category)
                .cloned()
                .unwrap_or_else(|| WeeklyAggregate::empty(week, category, now));

            // Leave the row byte-identical (including updated_at) when the
            // rescan changes nothing.
            if row.received == new_received && row.treated == new_treated {
                continue;
            }

            row.received = new_received;
            row.treated = new_treated;
            row.updated_at = now;
            tables.upsert_aggregate(row);
        }
    }
}

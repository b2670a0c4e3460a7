use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mailstock_core::{Category, WeekId};

/// Item identifier: the opaque unique string minted by the mail platform.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Resolution state of an item.
///
/// Transitions only move forward: `Open → Treated → Deleted` (or `Open →
/// Deleted` directly, which stamps treated at the same instant since deletion
/// always implies resolution). A treated timestamp, once present, is carried
/// through deletion and can never be cleared.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Disposition {
    Open,
    Treated {
        at: DateTime<Utc>,
    },
    Deleted {
        at: DateTime<Utc>,
        treated_at: DateTime<Utc>,
    },
}

impl Disposition {
    pub fn treated_at(self) -> Option<DateTime<Utc>> {
        match self {
            Disposition::Open => None,
            Disposition::Treated { at } => Some(at),
            Disposition::Deleted { treated_at, .. } => Some(treated_at),
        }
    }

    pub fn deleted_at(self) -> Option<DateTime<Utc>> {
        match self {
            Disposition::Deleted { at, .. } => Some(at),
            _ => None,
        }
    }

    /// Stamp the treated timestamp if it is not already set.
    fn treat(self, at: DateTime<Utc>) -> Disposition {
        match self {
            Disposition::Open => Disposition::Treated { at },
            other => other,
        }
    }

    /// Soft-delete, stamping treated at the same instant when still open.
    fn delete(self, at: DateTime<Utc>) -> Disposition {
        match self {
            Disposition::Open => Disposition::Deleted { at, treated_at: at },
            Disposition::Treated { at: treated_at } => Disposition::Deleted { at, treated_at },
            deleted @ Disposition::Deleted { .. } => deleted,
        }
    }
}

/// Mutable attributes carried by a state-change event, already translated to
/// domain terms (locations resolved to categories by the caller).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateChange {
    pub read: Option<bool>,
    pub category: Option<Category>,
    /// Explicit treated request. `true` stamps the treated timestamp if
    /// unset; `false` only toggles the legacy flag.
    pub treated: Option<bool>,
}

/// One tracked unit of incoming work.
///
/// The arrival timestamp is fixed at creation and defines the arrival week
/// forever; everything else evolves through [`Item::apply_change`] and
/// [`Item::apply_delete`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    category: Category,
    arrived_at: DateTime<Utc>,
    read: bool,
    /// Legacy convenience flag shown by old consumers. Freely toggled, no
    /// effect on week attribution.
    treated_flag: bool,
    disposition: Disposition,
}

impl Item {
    pub fn new(id: ItemId, category: Category, arrived_at: DateTime<Utc>, read: bool) -> Self {
        Self {
            id,
            category,
            arrived_at,
            read,
            treated_flag: false,
            disposition: Disposition::Open,
        }
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn arrived_at(&self) -> DateTime<Utc> {
        self.arrived_at
    }

    pub fn is_read(&self) -> bool {
        self.read
    }

    pub fn treated_flag(&self) -> bool {
        self.treated_flag
    }

    pub fn disposition(&self) -> Disposition {
        self.disposition
    }

    pub fn treated_at(&self) -> Option<DateTime<Utc>> {
        self.disposition.treated_at()
    }

    /// Week the item arrived in. Never changes after creation.
    pub fn arrival_week(&self) -> WeekId {
        WeekId::of(self.arrived_at)
    }

    /// Week the item was treated in, if it has been.
    pub fn treated_week(&self) -> Option<WeekId> {
        self.treated_at().map(WeekId::of)
    }

    /// Apply a state change observed at `observed_at`.
    ///
    /// With `read_as_treated` enabled, the first unread → read transition on
    /// a still-open item stamps the treated timestamp as well.
    ///
    /// Returns `true` if any field actually changed, so callers can skip
    /// recomputation for redundant deliveries.
    pub fn apply_change(
        &mut self,
        change: StateChange,
        observed_at: DateTime<Utc>,
        read_as_treated: bool,
    ) -> bool {
        let mut changed = false;

        if let Some(category) = change.category {
            if category != self.category {
                self.category = category;
                changed = true;
            }
        }

        if let Some(read) = change.read {
            if read != self.read {
                let first_read = read && !self.read;
                self.read = read;
                changed = true;
                if first_read && read_as_treated {
                    self.disposition = self.disposition.treat(observed_at);
                }
            }
        }

        if let Some(treated) = change.treated {
            if treated != self.treated_flag {
                self.treated_flag = treated;
                changed = true;
            }
            if treated && self.disposition.treated_at().is_none() {
                self.disposition = self.disposition.treat(observed_at);
                changed = true;
            }
        }

        changed
    }

    /// Soft-delete at `at`. Stamps treated at the same instant if the item
    /// was still open. Returns `false` when already deleted.
    pub fn apply_delete(&mut self, at: DateTime<Utc>) -> bool {
        if self.disposition.deleted_at().is_some() {
            return false;
        }
        self.disposition = self.disposition.delete(at);
        self.treated_flag = true;
        true
    }
}

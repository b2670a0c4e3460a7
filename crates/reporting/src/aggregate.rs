use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use mailstock_core::{Category, WeekId};

/// One (week, category) row of the weekly inventory report.
///
/// `received` and `treated` are derived from the ledger and clamped to zero
/// on every write; `manual_adjustment` is a signed running sum of
/// out-of-band corrections and is never touched by recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyAggregate {
    pub week: WeekId,
    pub category: Category,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub received: i64,
    pub treated: i64,
    pub manual_adjustment: i64,
    pub updated_at: DateTime<Utc>,
}

impl WeeklyAggregate {
    /// A zeroed row for a (week, category) pair, with week bounds filled in.
    pub fn empty(week: WeekId, category: Category, updated_at: DateTime<Utc>) -> Self {
        Self {
            week,
            category,
            week_start: week.start(),
            week_end: week.end(),
            received: 0,
            treated: 0,
            manual_adjustment: 0,
            updated_at,
        }
    }

    /// Clamp the ledger-derived counters to zero.
    ///
    /// Negative values can only come from external direct edits of the
    /// stored row; they are corrected here rather than propagated.
    pub fn clamp_counters(&mut self) {
        self.received = self.received.max(0);
        self.treated = self.treated.max(0);
    }

    /// Received count with corruption clamped away (read-side safety; the
    /// write path already clamps).
    pub fn sane_received(&self) -> i64 {
        self.received.max(0)
    }

    /// Treated count with corruption clamped away.
    pub fn sane_treated(&self) -> i64 {
        self.treated.max(0)
    }

    /// Weekly outflow: resolutions plus manual corrections.
    pub fn outflow(&self) -> i64 {
        self.sane_treated() + self.manual_adjustment
    }

    /// Net backlog movement contributed by this week.
    pub fn net(&self) -> i64 {
        self.sane_received() - self.outflow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row() -> WeeklyAggregate {
        let week = WeekId::new(2024, 31).unwrap();
        WeeklyAggregate::empty(
            week,
            Category::Declaration,
            Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn empty_row_carries_week_bounds() {
        let r = row();
        assert_eq!(r.week_start, r.week.start());
        assert_eq!(r.week_end, r.week.end());
        assert_eq!((r.received, r.treated, r.manual_adjustment), (0, 0, 0));
    }

    #[test]
    fn clamp_repairs_corrupted_counters() {
        let mut r = row();
        r.received = -4;
        r.treated = -1;
        r.manual_adjustment = -2;
        r.clamp_counters();
        assert_eq!((r.received, r.treated), (0, 0));
        // Manual adjustments are legitimately signed.
        assert_eq!(r.manual_adjustment, -2);
    }

    #[test]
    fn net_counts_adjustment_as_outflow() {
        let mut r = row();
        r.received = 10;
        r.treated = 3;
        r.manual_adjustment = 2;
        assert_eq!(r.outflow(), 5);
        assert_eq!(r.net(), 5);
    }
}

//! Historical bulk import rows.
//!
//! A seeding collaborator hands over already-aggregated weekly counts (one
//! row per week and category) that overwrite the aggregate table directly,
//! bypassing the ledger. Spreadsheet parsing happens upstream; by the time a
//! row reaches this module it is structured but still untrusted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use mailstock_core::{Category, DomainError, DomainResult, WeekId};

use crate::aggregate::WeeklyAggregate;

/// One untrusted row from the bulk-import collaborator.
///
/// The category arrives as a label because legacy exports carry display
/// spellings; it is resolved through the strict alias table (no default
/// fallback, unlike location classification — a row without a recognizable
/// category is malformed, not "other").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRow {
    pub year: i32,
    pub week: u32,
    pub category: String,
    pub received: i64,
    pub treated: i64,
    #[serde(default)]
    pub manual_adjustment: i64,
}

impl ImportRow {
    /// Validate into a storable aggregate row.
    pub fn validate(&self, updated_at: DateTime<Utc>) -> DomainResult<WeeklyAggregate> {
        let week = WeekId::new(self.year, self.week)?;

        let category = Category::from_label(&self.category).ok_or_else(|| {
            DomainError::validation(format!("unrecognized category label {:?}", self.category))
        })?;

        if self.received < 0 || self.treated < 0 {
            return Err(DomainError::validation(format!(
                "negative counters (received={}, treated={})",
                self.received, self.treated
            )));
        }

        let mut row = WeeklyAggregate::empty(week, category, updated_at);
        row.received = self.received;
        row.treated = self.treated;
        row.manual_adjustment = self.manual_adjustment;
        Ok(row)
    }
}

/// Outcome of one import batch: how many rows were written vs. skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub accepted: usize,
    pub skipped: usize,
}

/// Validate a batch, logging and skipping malformed rows.
///
/// One bad row never aborts the batch; the caller gets the accepted rows
/// plus a count of both populations.
pub fn validate_batch(
    rows: &[ImportRow],
    updated_at: DateTime<Utc>,
) -> (Vec<WeeklyAggregate>, ImportReport) {
    let mut accepted = Vec::with_capacity(rows.len());
    let mut report = ImportReport::default();

    for row in rows {
        match row.validate(updated_at) {
            Ok(aggregate) => {
                accepted.push(aggregate);
                report.accepted += 1;
            }
            Err(error) => {
                warn!(
                    year = row.year,
                    week = row.week,
                    category = %row.category,
                    %error,
                    "skipping malformed history row"
                );
                report.skipped += 1;
            }
        }
    }

    (accepted, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap()
    }

    fn good_row() -> ImportRow {
        ImportRow {
            year: 2024,
            week: 31,
            category: "Déclarations".to_string(),
            received: 20,
            treated: 5,
            manual_adjustment: 1,
        }
    }

    #[test]
    fn valid_row_becomes_aggregate_with_bounds() {
        let agg = good_row().validate(now()).unwrap();
        assert_eq!(agg.week, WeekId::new(2024, 31).unwrap());
        assert_eq!(agg.category, Category::Declaration);
        assert_eq!(agg.week_start, agg.week.start());
        assert_eq!((agg.received, agg.treated, agg.manual_adjustment), (20, 5, 1));
    }

    #[test]
    fn unknown_category_label_is_rejected() {
        let mut row = good_row();
        row.category = "Factures".to_string();
        assert!(matches!(
            row.validate(now()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn invalid_week_is_rejected() {
        let mut row = good_row();
        row.week = 53; // 2024 has 52 ISO weeks
        assert!(matches!(row.validate(now()), Err(DomainError::InvalidWeek(_))));
    }

    #[test]
    fn negative_counters_are_rejected_but_adjustment_may_be_negative() {
        let mut row = good_row();
        row.received = -1;
        assert!(row.validate(now()).is_err());

        let mut row = good_row();
        row.manual_adjustment = -7;
        assert_eq!(row.validate(now()).unwrap().manual_adjustment, -7);
    }

    #[test]
    fn batch_skips_bad_rows_and_keeps_the_rest() {
        let mut bad = good_row();
        bad.category = String::new();
        let rows = vec![good_row(), bad, good_row()];

        let (accepted, report) = validate_batch(&rows, now());
        assert_eq!(accepted.len(), 2);
        assert_eq!(report, ImportReport { accepted: 2, skipped: 1 });
    }

    #[test]
    fn rows_parse_from_json_with_defaulted_adjustment() {
        let json = r#"{"year":2024,"week":10,"category":"paiements","received":3,"treated":0}"#;
        let row: ImportRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.manual_adjustment, 0);
        assert_eq!(row.validate(now()).unwrap().category, Category::Paiement);
    }
}

//! Carry-over (rolling stock) replay.

use std::collections::BTreeMap;

use mailstock_core::{Category, WeekId};

use crate::aggregate::WeeklyAggregate;

/// Backlog per category immediately before `target`, replayed from all rows
/// strictly older than the target week in chronological order.
///
/// Per week and category: `net = received - (treated + manual_adjustment)`,
/// `stock = max(0, stock_prev + net)`. The clamp is applied after every
/// single week, so a week that over-resolves resets its category to zero
/// before the next week's net is applied. This is deliberately not a
/// cumulative sum with one final clamp.
///
/// Manual adjustments count as outflow here, alongside treated. The legacy
/// reporting path also knew a "received + adjustment" reading; that one is
/// intentionally not implemented (see DESIGN.md).
///
/// Rows with corrupted negative counters are sanitized before use; read-only
/// replay never trusts stored values it did not clamp itself.
pub fn stock_before<'a, I>(rows: I, target: WeekId) -> BTreeMap<Category, i64>
where
    I: IntoIterator<Item = &'a WeeklyAggregate>,
{
    // Group by week first so replay order is by calendar, not storage order.
    let mut by_week: BTreeMap<WeekId, Vec<&WeeklyAggregate>> = BTreeMap::new();
    for row in rows {
        if row.week < target {
            by_week.entry(row.week).or_default().push(row);
        }
    }

    let mut stock: BTreeMap<Category, i64> =
        Category::ALL.iter().map(|c| (*c, 0)).collect();

    for rows in by_week.values() {
        for row in rows {
            if let Some(level) = stock.get_mut(&row.category) {
                *level = (*level + row.net()).max(0);
            }
        }
    }

    stock
}

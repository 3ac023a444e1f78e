//! Weekly tax calculation
//!
//! The due amount has two components: a base tax from the first level
//! range rule matching the player's level, and an automation tax of
//! `multiplier` per automation-engine level summed over all of the
//! player's companies. Amounts are kept at 2-decimal precision.

use crate::db::models::TaxRule;

/// Default automation multiplier when no setting has been stored.
pub const DEFAULT_AUTOMATION_MULTIPLIER: f64 = 0.5;

/// Result of a tax computation for one player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxBreakdown {
    pub total: f64,
    pub base_due: f64,
    pub automation_due: f64,
}

/// Round to 2 decimal places (money precision used throughout).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compute the weekly due for one player.
///
/// `rules` are scanned in order; the first rule whose inclusive range
/// contains `level` supplies the base due. No matching rule means a
/// base of zero (the player is below or outside every configured tier).
pub fn calc_tax(
    level: i64,
    automation_levels: &[i64],
    rules: &[TaxRule],
    multiplier: f64,
) -> TaxBreakdown {
    let base_due = rules
        .iter()
        .find(|r| r.min_level <= level && level <= r.max_level)
        .map(|r| r.base_due)
        .unwrap_or(0.0);

    let automation_due = round2(
        automation_levels
            .iter()
            .map(|lvl| *lvl as f64 * multiplier)
            .sum(),
    );

    TaxBreakdown {
        total: round2(base_due + automation_due),
        base_due,
        automation_due,
    }
}

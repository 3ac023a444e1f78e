//! Payment status classification
//!
//! Maps a (due, paid) pair to the reporting category shown on the
//! dashboard.

use serde::{Deserialize, Serialize};

/// Reporting category for one player's weekly standing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxStatus {
    /// No tax required this week
    NotApplicable,
    /// Paid exactly the required amount
    Paid,
    /// Paid something, but less than required
    Partial,
    /// No payment made
    Unpaid,
    /// Paid more than required
    Legend,
}

impl TaxStatus {
    /// Short label used in rendered reports.
    pub fn label(&self) -> &'static str {
        match self {
            TaxStatus::NotApplicable => "N/A",
            TaxStatus::Paid => "PAID",
            TaxStatus::Partial => "PARTIAL",
            TaxStatus::Unpaid => "UNPAID",
            TaxStatus::Legend => "LEGEND",
        }
    }
}

/// Classify a player's standing. A zero due always wins, whatever was
/// paid.
pub fn classify(due: f64, paid: f64) -> TaxStatus {
    if due == 0.0 {
        TaxStatus::NotApplicable
    } else if paid > due {
        TaxStatus::Legend
    } else if paid == due {
        TaxStatus::Paid
    } else if paid > 0.0 {
        TaxStatus::Partial
    } else {
        TaxStatus::Unpaid
    }
}

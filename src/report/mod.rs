//! Reporting utilities: per-slice outcomes and protocol winners.
//!
//! We keep formatting code in `format` so:
//! - the ranking logic stays clean and testable
//! - output changes are localized

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{FitOutcome, ProtocolMetrics, SecurityClass, TrackedVariable};

pub mod format;

pub use format::*;

/// Outcome of one 2D slice, as reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliceReport {
    pub variable: TrackedVariable,
    pub protocol: String,
    /// Slice file name (`<Tag><protocol>.txt`).
    pub file_name: String,
    pub outcome: FitOutcome,
}

/// Best protocol seen for one (security class, variable) cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Winner {
    pub protocol: String,
    pub coefficient: f64,
}

impl Winner {
    fn sentinel() -> Self {
        Self {
            protocol: String::new(),
            coefficient: f64::INFINITY,
        }
    }

    fn is_set(&self) -> bool {
        !self.protocol.is_empty()
    }
}

/// Flattened winner cell for exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinnerEntry {
    pub class: SecurityClass,
    pub variable: TrackedVariable,
    pub protocol: String,
    pub coefficient: f64,
}

/// Lowest leading coefficient per (security class, tracked variable).
#[derive(Debug, Clone)]
pub struct WinnerTable {
    cells: [[Winner; TrackedVariable::COUNT]; 4],
}

impl Default for WinnerTable {
    fn default() -> Self {
        Self::new()
    }
}

impl WinnerTable {
    pub fn new() -> Self {
        Self {
            cells: std::array::from_fn(|_| std::array::from_fn(|_| Winner::sentinel())),
        }
    }

    /// Record `coefficient` for `protocol`; replaces the cell only if strictly lower.
    ///
    /// Returns whether the cell changed. Equal coefficients keep the earlier protocol.
    pub fn offer(
        &mut self,
        class: SecurityClass,
        variable: TrackedVariable,
        protocol: &str,
        coefficient: f64,
    ) -> bool {
        let cell = &mut self.cells[class.index()][variable.index()];
        if coefficient < cell.coefficient {
            *cell = Winner {
                protocol: protocol.to_string(),
                coefficient,
            };
            true
        } else {
            false
        }
    }

    /// Winner of a cell, or `None` while it still holds the sentinel.
    pub fn get(&self, class: SecurityClass, variable: TrackedVariable) -> Option<&Winner> {
        let cell = &self.cells[class.index()][variable.index()];
        cell.is_set().then_some(cell)
    }

    /// All filled cells, class-major.
    pub fn entries(&self) -> Vec<WinnerEntry> {
        let mut out = Vec::new();
        for class in SecurityClass::ALL {
            for variable in TrackedVariable::ALL {
                if let Some(w) = self.get(class, variable) {
                    out.push(WinnerEntry {
                        class,
                        variable,
                        protocol: w.protocol.clone(),
                        coefficient: w.coefficient,
                    });
                }
            }
        }
        out
    }
}

/// Everything a run produced, for JSON export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub table: String,
    /// Communication metrics per protocol, keyed by protocol name.
    pub metrics: BTreeMap<String, ProtocolMetrics>,
    pub slices: Vec<SliceReport>,
    pub files_3d: Vec<String>,
    pub winners: Vec<WinnerEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    use SecurityClass::*;
    use TrackedVariable::*;

    fn fold(table: &mut WinnerTable, offers: &[(SecurityClass, TrackedVariable, &str, f64)]) {
        for &(class, var, protocol, coef) in offers {
            table.offer(class, var, protocol, coef);
        }
    }

    #[test]
    fn lower_is_better() {
        let mut t = WinnerTable::new();
        assert!(t.get(MaliciousDishonestMajority, Latency).is_none());
        assert!(t.offer(MaliciousDishonestMajority, Latency, "mascot", 0.5));
        assert!(t.offer(MaliciousDishonestMajority, Latency, "lowgear", 0.25));
        assert!(!t.offer(MaliciousDishonestMajority, Latency, "highgear", 0.3));
        let w = t.get(MaliciousDishonestMajority, Latency).unwrap();
        assert_eq!(w.protocol, "lowgear");
        assert_eq!(w.coefficient, 0.25);
        // Other cells untouched.
        assert!(t.get(MaliciousHonestMajority, Latency).is_none());
        assert!(t.get(MaliciousDishonestMajority, Bandwidth).is_none());
    }

    #[test]
    fn order_independent_without_ties() {
        let offers = [
            (SemiHonestHonestMajority, Latency, "shamir", 0.4),
            (SemiHonestHonestMajority, Latency, "atlas", 0.2),
            (SemiHonestHonestMajority, Latency, "ccd", 0.9),
            (MaliciousHonestMajority, Bandwidth, "semi", 3.0),
            (MaliciousHonestMajority, Bandwidth, "hemi", -1.0),
        ];
        let mut forward = WinnerTable::new();
        fold(&mut forward, &offers);

        let mut reversed_offers = offers;
        reversed_offers.reverse();
        let mut backward = WinnerTable::new();
        fold(&mut backward, &reversed_offers);

        let mut rotated_offers = offers;
        rotated_offers.rotate_left(2);
        let mut rotated = WinnerTable::new();
        fold(&mut rotated, &rotated_offers);

        assert_eq!(forward.entries(), backward.entries());
        assert_eq!(forward.entries(), rotated.entries());
        assert_eq!(forward.entries().len(), 2);
    }

    #[test]
    fn ties_keep_first_seen() {
        let mut a = WinnerTable::new();
        fold(
            &mut a,
            &[(SemiHonestHonestMajority, Quota, "shamir", 1.0), (SemiHonestHonestMajority, Quota, "atlas", 1.0)],
        );
        let mut b = WinnerTable::new();
        fold(
            &mut b,
            &[(SemiHonestHonestMajority, Quota, "atlas", 1.0), (SemiHonestHonestMajority, Quota, "shamir", 1.0)],
        );
        assert_eq!(a.get(SemiHonestHonestMajority, Quota).unwrap().protocol, "shamir");
        assert_eq!(b.get(SemiHonestHonestMajority, Quota).unwrap().protocol, "atlas");
    }

    #[test]
    fn nan_never_wins() {
        let mut t = WinnerTable::new();
        assert!(!t.offer(MaliciousDishonestMajority, Latency, "mascot", f64::NAN));
        assert!(t.get(MaliciousDishonestMajority, Latency).is_none());
    }
}

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::assignment::Assignment;
use crate::types::{FacilityId, Money};
use crate::{LoanAllocationError, LoanAllocationResult};

/// Decimal places kept in reported yields.
pub const REPORT_DECIMAL_PLACES: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityYield {
    pub facility_id: FacilityId,
    pub expected_yield: Money,
}

/// Running expected yield per facility.
///
/// Totals are kept at full precision; truncation to cents happens only when
/// a report is produced.
#[derive(Debug, Clone, Default)]
pub struct YieldLedger {
    totals: BTreeMap<FacilityId, Money>,
}

impl YieldLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an assignment's expected yield to its facility's total and
    /// return that contribution.
    pub fn record(&mut self, assignment: &Assignment) -> LoanAllocationResult<Money> {
        let contribution = assignment.expected_yield()?;
        let total = self
            .totals
            .entry(assignment.facility_id())
            .or_insert(Decimal::ZERO);
        *total = total
            .checked_add(contribution)
            .ok_or_else(|| LoanAllocationError::InvalidInput {
                field: format!("facilities[{}].expected_yield", assignment.facility_id()),
                reason: "Running yield total exceeds the decimal range".into(),
            })?;
        Ok(contribution)
    }

    /// Unrounded running total for one facility.
    pub fn total(&self, facility_id: FacilityId) -> Option<Money> {
        self.totals.get(&facility_id).copied()
    }

    /// Facilities that have accepted at least one loan.
    pub fn contains(&self, facility_id: FacilityId) -> bool {
        self.totals.contains_key(&facility_id)
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Per-facility yields, ascending by facility id, truncated to cents.
    /// Facilities without an accepted loan are absent.
    pub fn report(&self) -> Vec<FacilityYield> {
        self.totals
            .iter()
            .map(|(&facility_id, &total)| FacilityYield {
                facility_id,
                expected_yield: truncate_to_cents(total),
            })
            .collect()
    }
}

/// Truncate to two decimal places (toward zero, never rounding up or
/// down). Trailing zeros are dropped so that -36.000 reports as -36.
pub fn truncate_to_cents(value: Money) -> Money {
    value
        .round_dp_with_strategy(REPORT_DECIMAL_PLACES, RoundingStrategy::ToZero)
        .normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lending::{LenderBook, Loan};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn assign(book: &mut LenderBook, slot: usize, loan: Loan) -> Assignment {
        let (facility, bank) = book.pair_at_mut(slot);
        Assignment::try_new(&loan, facility, bank).unwrap()
    }

    fn book() -> LenderBook {
        let mut book = LenderBook::new();
        book.add_bank(1, "B1").unwrap();
        book.open_facility(1, 4, dec!(10_000), dec!(0.05)).unwrap();
        book.open_facility(1, 2, dec!(10_000), dec!(0.01)).unwrap();
        book.open_facility(1, 9, dec!(10_000), dec!(0.02)).unwrap();
        book
    }

    #[test]
    fn test_truncate_to_cents() {
        assert_eq!(truncate_to_cents(dec!(12.349)), dec!(12.34));
        assert_eq!(truncate_to_cents(dec!(12.345)), dec!(12.34));
        assert_eq!(truncate_to_cents(dec!(12.3)), dec!(12.3));
        assert_eq!(truncate_to_cents(dec!(-36)), dec!(-36));
        assert_eq!(truncate_to_cents(dec!(-36.000)).to_string(), "-36");
        assert_eq!(truncate_to_cents(dec!(26.150)).to_string(), "26.15");
    }

    #[test]
    fn test_negative_totals_truncate_toward_zero() {
        assert_eq!(truncate_to_cents(dec!(-0.001)), dec!(0));
        assert_eq!(truncate_to_cents(dec!(-6.0025)), dec!(-6));
        assert_eq!(truncate_to_cents(dec!(-6.0025)).to_string(), "-6");
        assert_eq!(truncate_to_cents(dec!(-24.809)), dec!(-24.8));
    }

    #[test]
    fn test_negative_loan_yield_reported_truncated() {
        let mut book = book();
        let mut ledger = YieldLedger::new();

        // 0.9 * 0.10 * 100.05 - 0.1 * 100.05 - 0.05 * 100.05 = -6.0025
        let a = assign(&mut book, 0, Loan::new(1, dec!(0.10), dec!(100.05), dec!(0.1), "TX"));
        assert_eq!(ledger.record(&a).unwrap(), dec!(-6.0025));

        assert_eq!(
            ledger.report(),
            vec![FacilityYield {
                facility_id: 4,
                expected_yield: dec!(-6)
            }]
        );
    }

    #[test]
    fn test_totals_accumulate_per_facility() {
        let mut book = book();
        let mut ledger = YieldLedger::new();

        // 0.98 * 0.15 * 100 - 0.02 * 100 - 0.05 * 100 = 7.7
        let a = assign(&mut book, 0, Loan::new(1, dec!(0.15), dec!(100), dec!(0.02), "CA"));
        assert_eq!(ledger.record(&a).unwrap(), dec!(7.7));
        let b = assign(&mut book, 0, Loan::new(2, dec!(0.15), dec!(100), dec!(0.02), "CA"));
        ledger.record(&b).unwrap();

        assert_eq!(ledger.total(4), Some(dec!(15.4)));
        assert_eq!(ledger.total(2), None);
        assert!(ledger.contains(4));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_truncation_applied_to_total_not_each_loan() {
        let mut book = book();
        let mut ledger = YieldLedger::new();

        // Each loan yields 0.99 * 0.1 * 33 - 0.01 * 33 - 0.01 * 33 = 2.607
        for id in 0..3 {
            let a = assign(&mut book, 1, Loan::new(id, dec!(0.1), dec!(33), dec!(0.01), "WA"));
            ledger.record(&a).unwrap();
        }

        assert_eq!(ledger.total(2), Some(dec!(7.821)));
        let report = ledger.report();
        assert_eq!(
            report,
            vec![FacilityYield {
                facility_id: 2,
                expected_yield: dec!(7.82)
            }]
        );
    }

    #[test]
    fn test_report_ascending_by_facility_and_omits_idle() {
        let mut book = book();
        let mut ledger = YieldLedger::new();

        for slot in [0, 2] {
            let a = assign(&mut book, slot, Loan::new(1, dec!(0.1), dec!(100), dec!(0), "TX"));
            ledger.record(&a).unwrap();
        }

        let ids: Vec<FacilityId> = ledger.report().iter().map(|y| y.facility_id).collect();
        assert_eq!(ids, vec![4, 9]);
        assert!(YieldLedger::new().report().is_empty());
    }
}

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::assignment::Assignment;
use crate::error::Rejection;
use crate::lending::{Facility, LenderBook, Loan};
use crate::types::{FacilityId, LoanId};

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// One facility declining one loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacilityRejection {
    pub loan_id: LoanId,
    pub facility_id: FacilityId,
    pub kind: String,
    pub reason: String,
}

impl FacilityRejection {
    fn new(loan_id: LoanId, facility_id: FacilityId, rejection: &Rejection) -> Self {
        FacilityRejection {
            loan_id,
            facility_id,
            kind: rejection.kind().to_string(),
            reason: rejection.to_string(),
        }
    }
}

/// Result of offering one loan to the ranked facilities.
#[derive(Debug, Clone, Default)]
pub struct AssignmentOutcome {
    pub assignment: Option<Assignment>,
    /// Facilities that declined the loan before it was placed, in scan order.
    pub rejections: Vec<FacilityRejection>,
}

// ---------------------------------------------------------------------------
// LoanAssigner
// ---------------------------------------------------------------------------

/// First-fit assignment over facilities ranked by ascending interest rate.
///
/// The ranking is fixed at construction. Each loan is offered to the
/// facilities in that order and placed with the first one that accepts it.
/// A placement is never revisited, and a loan nobody accepts is dropped.
#[derive(Debug, Clone)]
pub struct LoanAssigner {
    book: LenderBook,
    ranking: Vec<usize>,
}

impl LoanAssigner {
    pub fn new(book: LenderBook) -> Self {
        let mut ranking: Vec<usize> = (0..book.facilities().len()).collect();
        // Stable: equal rates keep load order.
        ranking.sort_by(|&a, &b| {
            book.facilities()[a]
                .interest_rate()
                .cmp(&book.facilities()[b].interest_rate())
        });

        LoanAssigner { book, ranking }
    }

    /// Place `loan` with the cheapest facility that accepts it.
    pub fn assign(&mut self, loan: &Loan) -> Option<Assignment> {
        self.assign_with_diagnostics(loan).assignment
    }

    /// Same as [`LoanAssigner::assign`], additionally returning every
    /// rejection met along the way.
    pub fn assign_with_diagnostics(&mut self, loan: &Loan) -> AssignmentOutcome {
        let mut outcome = AssignmentOutcome::default();

        for &slot in &self.ranking {
            let (facility, bank) = self.book.pair_at_mut(slot);
            match Assignment::try_new(loan, facility, bank) {
                Ok(assignment) => {
                    outcome.assignment = Some(assignment);
                    break;
                }
                Err(rejection) => {
                    debug!(
                        loan_id = loan.id,
                        facility_id = facility.id(),
                        kind = rejection.kind(),
                        "{}",
                        rejection
                    );
                    outcome
                        .rejections
                        .push(FacilityRejection::new(loan.id, facility.id(), &rejection));
                }
            }
        }

        outcome
    }

    /// Facilities in the order loans are offered to them.
    pub fn ranked_facilities(&self) -> impl Iterator<Item = &Facility> + '_ {
        self.ranking
            .iter()
            .map(move |&slot| &self.book.facilities()[slot])
    }

    pub fn book(&self) -> &LenderBook {
        &self.book
    }

    pub fn into_book(self) -> LenderBook {
        self.book
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lending::{Covenant, CovenantTarget};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn tx_loan(id: LoanId, amount: Decimal) -> Loan {
        Loan::new(id, dec!(0.10), amount, dec!(0.1), "TX")
    }

    /// B1 owns F1 (1000 @ 5%) and F2 (500 @ 8%).
    fn two_facility_book() -> LenderBook {
        let mut book = LenderBook::new();
        book.add_bank(1, "B1").unwrap();
        book.open_facility(1, 1, dec!(1000), dec!(0.05)).unwrap();
        book.open_facility(1, 2, dec!(500), dec!(0.08)).unwrap();
        book
    }

    #[test]
    fn test_ranking_sorted_by_rate() {
        let mut book = LenderBook::new();
        book.add_bank(1, "B1").unwrap();
        book.open_facility(1, 1, dec!(100), dec!(0.09)).unwrap();
        book.open_facility(1, 2, dec!(100), dec!(0.01)).unwrap();
        book.open_facility(1, 3, dec!(100), dec!(0.05)).unwrap();

        let assigner = LoanAssigner::new(book);
        let order: Vec<FacilityId> = assigner.ranked_facilities().map(|f| f.id()).collect();
        assert_eq!(order, vec![2, 3, 1]);
    }

    #[test]
    fn test_equal_rates_keep_load_order() {
        let mut book = LenderBook::new();
        book.add_bank(1, "B1").unwrap();
        book.add_bank(2, "B2").unwrap();
        book.open_facility(2, 7, dec!(100), dec!(0.04)).unwrap();
        book.open_facility(1, 3, dec!(100), dec!(0.04)).unwrap();
        book.open_facility(1, 5, dec!(100), dec!(0.02)).unwrap();
        book.open_facility(2, 1, dec!(100), dec!(0.04)).unwrap();

        let mut assigner = LoanAssigner::new(book);
        let order: Vec<FacilityId> = assigner.ranked_facilities().map(|f| f.id()).collect();
        assert_eq!(order, vec![5, 7, 3, 1]);

        // Facility 5 is cheapest; once it is full, ties resolve by load order.
        let placed: Vec<FacilityId> = (1..=4)
            .filter_map(|id| assigner.assign(&tx_loan(id, dec!(100))))
            .map(|a| a.facility_id())
            .collect();
        assert_eq!(placed, vec![5, 7, 3, 1]);
    }

    #[test]
    fn test_first_fit_then_exhaustion() {
        let mut assigner = LoanAssigner::new(two_facility_book());

        let first = assigner.assign(&tx_loan(1, dec!(600))).unwrap();
        assert_eq!(first.facility_id(), 1);
        assert_eq!(assigner.book().facility(1).unwrap().remaining_capacity(), dec!(400));

        // 600 > 400 left on F1 and 600 > 500 on F2.
        assert!(assigner.assign(&tx_loan(2, dec!(600))).is_none());
        assert_eq!(assigner.book().facility(1).unwrap().remaining_capacity(), dec!(400));
        assert_eq!(assigner.book().facility(2).unwrap().remaining_capacity(), dec!(500));
    }

    #[test]
    fn test_falls_through_to_pricier_facility() {
        let mut assigner = LoanAssigner::new(two_facility_book());
        assigner.assign(&tx_loan(1, dec!(600))).unwrap();

        let second = assigner.assign(&tx_loan(2, dec!(450))).unwrap();
        assert_eq!(second.facility_id(), 2);
        assert_eq!(assigner.book().facility(2).unwrap().remaining_capacity(), dec!(50));
    }

    #[test]
    fn test_banned_state_skips_cheapest_facility() {
        let mut book = two_facility_book();
        book.open_facility(1, 3, dec!(1000), dec!(0.01)).unwrap();
        book.attach_covenant(Covenant::banning(CovenantTarget::Facility(3), "NY"))
            .unwrap();
        let mut assigner = LoanAssigner::new(book);

        let ny = Loan::new(1, dec!(0.10), dec!(100), dec!(0.1), "NY");
        let outcome = assigner.assign_with_diagnostics(&ny);
        assert_eq!(outcome.assignment.unwrap().facility_id(), 1);
        assert_eq!(outcome.rejections.len(), 1);
        assert_eq!(outcome.rejections[0].facility_id, 3);
        assert_eq!(outcome.rejections[0].kind, "banned_jurisdiction");
        assert_eq!(assigner.book().facility(3).unwrap().remaining_capacity(), dec!(1000));
    }

    #[test]
    fn test_bank_covenant_blocks_every_facility_of_bank() {
        let mut book = two_facility_book();
        book.attach_covenant(Covenant::banning(CovenantTarget::Bank(1), "TX"))
            .unwrap();
        let mut assigner = LoanAssigner::new(book);

        let outcome = assigner.assign_with_diagnostics(&tx_loan(1, dec!(10)));
        assert!(outcome.assignment.is_none());
        let declined: Vec<FacilityId> = outcome.rejections.iter().map(|r| r.facility_id).collect();
        assert_eq!(declined, vec![1, 2]);
    }

    #[test]
    fn test_lesser_of_bank_and_facility_caps_applies() {
        let mut book = two_facility_book();
        book.attach_covenant(Covenant::capping(CovenantTarget::Facility(1), dec!(0.3)))
            .unwrap();
        book.attach_covenant(Covenant::capping(CovenantTarget::Bank(1), dec!(0.05)))
            .unwrap();
        let mut assigner = LoanAssigner::new(book);

        assert!(assigner.assign(&tx_loan(1, dec!(10))).is_none());

        let safe = Loan::new(2, dec!(0.10), dec!(10), dec!(0.05), "TX");
        assert_eq!(assigner.assign(&safe).unwrap().facility_id(), 1);
    }

    #[test]
    fn test_capacity_matches_accepted_amounts() {
        let mut assigner = LoanAssigner::new(two_facility_book());
        let amounts = [dec!(300), dec!(800), dec!(450), dec!(250), dec!(100), dec!(75)];

        let mut accepted: Vec<(FacilityId, Decimal)> = Vec::new();
        for (i, amount) in amounts.iter().enumerate() {
            if let Some(a) = assigner.assign(&tx_loan(i as LoanId, *amount)) {
                accepted.push((a.facility_id(), *amount));
            }
        }

        for facility in assigner.book().facilities() {
            let taken: Decimal = accepted
                .iter()
                .filter(|(id, _)| *id == facility.id())
                .map(|(_, amt)| *amt)
                .sum();
            assert_eq!(facility.remaining_capacity(), facility.initial_capacity() - taken);
            assert!(facility.remaining_capacity() >= Decimal::ZERO);
        }
    }

    #[test]
    fn test_empty_book_assigns_nothing() {
        let mut assigner = LoanAssigner::new(LenderBook::new());
        let outcome = assigner.assign_with_diagnostics(&tx_loan(1, dec!(1)));
        assert!(outcome.assignment.is_none());
        assert!(outcome.rejections.is_empty());
    }
}

use serde::{Deserialize, Serialize};
use tracing::info;

use super::engine::{FacilityRejection, LoanAssigner};
use super::yields::{FacilityYield, YieldLedger};
use crate::lending::{LenderBook, Loan};
use crate::types::{BankId, FacilityId, LoanId, Money};
use crate::LoanAllocationResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One row of the assignment report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub loan_id: LoanId,
    pub facility_id: FacilityId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityCapacity {
    pub facility_id: FacilityId,
    pub bank_id: BankId,
    pub initial: Money,
    pub remaining: Money,
}

/// What happened to one loan.
#[derive(Debug, Clone, Default)]
pub struct LoanOutcome {
    pub assignment: Option<AssignmentRecord>,
    pub rejections: Vec<FacilityRejection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationSummary {
    pub loans_processed: usize,
    pub assigned_count: usize,
    pub unassigned_count: usize,
    pub yields: Vec<FacilityYield>,
    /// Sum of the reported (already cut) per-facility yields.
    pub total_expected_yield: Money,
    /// Facilities that accepted no loan, in load order.
    pub idle_facility_ids: Vec<FacilityId>,
    pub remaining_capacity: Vec<FacilityCapacity>,
}

// ---------------------------------------------------------------------------
// AllocationSession
// ---------------------------------------------------------------------------

/// Streaming allocation: feed loans one at a time in arrival order, then
/// call [`AllocationSession::finish`] for the yield report.
///
/// Only the yield ledger and running counts are retained; loans, assignment
/// rows and rejections are handed back to the caller as each loan is
/// processed.
#[derive(Debug)]
pub struct AllocationSession {
    assigner: LoanAssigner,
    ledger: YieldLedger,
    loans_processed: usize,
    assigned_count: usize,
    unassigned_count: usize,
}

impl AllocationSession {
    pub fn new(book: LenderBook) -> Self {
        AllocationSession {
            assigner: LoanAssigner::new(book),
            ledger: YieldLedger::new(),
            loans_processed: 0,
            assigned_count: 0,
            unassigned_count: 0,
        }
    }

    /// Offer one loan to the facilities. An error means the loan's yield
    /// left the decimal range; the run cannot continue meaningfully.
    pub fn process(&mut self, loan: &Loan) -> LoanAllocationResult<LoanOutcome> {
        self.loans_processed += 1;
        let outcome = self.assigner.assign_with_diagnostics(loan);

        let assignment = match outcome.assignment {
            Some(ref assignment) => {
                self.ledger.record(assignment)?;
                self.assigned_count += 1;
                Some(AssignmentRecord {
                    loan_id: loan.id,
                    facility_id: assignment.facility_id(),
                })
            }
            None => {
                self.unassigned_count += 1;
                None
            }
        };

        Ok(LoanOutcome {
            assignment,
            rejections: outcome.rejections,
        })
    }

    pub fn ledger(&self) -> &YieldLedger {
        &self.ledger
    }

    pub fn assigner(&self) -> &LoanAssigner {
        &self.assigner
    }

    pub fn finish(self) -> AllocationSummary {
        let yields = self.ledger.report();
        let total_expected_yield: Money = yields.iter().map(|y| y.expected_yield).sum();

        let book = self.assigner.into_book();
        let idle_facility_ids: Vec<FacilityId> = book
            .facilities()
            .iter()
            .filter(|f| !self.ledger.contains(f.id()))
            .map(|f| f.id())
            .collect();
        let remaining_capacity = book
            .facilities()
            .iter()
            .map(|f| FacilityCapacity {
                facility_id: f.id(),
                bank_id: f.bank_id(),
                initial: f.initial_capacity(),
                remaining: f.remaining_capacity(),
            })
            .collect();

        info!(
            loans = self.loans_processed,
            assigned = self.assigned_count,
            unassigned = self.unassigned_count,
            facilities_used = yields.len(),
            "allocation finished"
        );

        AllocationSummary {
            loans_processed: self.loans_processed,
            assigned_count: self.assigned_count,
            unassigned_count: self.unassigned_count,
            yields,
            total_expected_yield,
            idle_facility_ids,
            remaining_capacity,
        }
    }
}

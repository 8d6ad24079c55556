use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::instrument;

use super::engine::FacilityRejection;
use super::session::{AllocationSession, AssignmentRecord, FacilityCapacity};
use super::yields::FacilityYield;
use crate::dataset::{build_lenders, BankRecord, CovenantRecord, FacilityRecord, LoanRecord};
use crate::lending::Loan;
use crate::types::{with_metadata, ComputationOutput, LoanId, Money};
use crate::LoanAllocationResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationInput {
    pub banks: Vec<BankRecord>,
    pub facilities: Vec<FacilityRecord>,
    #[serde(default)]
    pub covenants: Vec<CovenantRecord>,
    /// Loans in arrival order. Order changes the result.
    pub loans: Vec<LoanRecord>,
    /// Report every facility rejection alongside the result.
    #[serde(default)]
    pub include_rejections: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationOutput {
    pub assignments: Vec<AssignmentRecord>,
    pub yields: Vec<FacilityYield>,
    pub total_expected_yield: Money,
    pub assigned_count: usize,
    pub unassigned_loan_ids: Vec<LoanId>,
    pub remaining_capacity: Vec<FacilityCapacity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejections: Option<Vec<FacilityRejection>>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Allocate a whole batch of loans in one call: build the lender book,
/// stream the loans through a session, and collect both reports.
#[instrument(skip(input), fields(
    banks = input.banks.len(),
    facilities = input.facilities.len(),
    loans = input.loans.len()
))]
pub fn allocate(input: &AllocationInput) -> LoanAllocationResult<ComputationOutput<AllocationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let book = build_lenders(&input.banks, &input.facilities, &input.covenants)?;
    if book.is_empty() {
        warnings.push("No facilities loaded; every loan will be unassigned.".into());
    }

    // Reject malformed loans up front so that a bad record cannot leave the
    // book half-allocated.
    let loans: Vec<Loan> = input
        .loans
        .iter()
        .cloned()
        .map(Loan::try_from)
        .collect::<LoanAllocationResult<_>>()?;

    let mut session = AllocationSession::new(book);
    let mut assignments: Vec<AssignmentRecord> = Vec::with_capacity(loans.len());
    let mut rejections: Vec<FacilityRejection> = Vec::new();
    let mut unassigned_loan_ids: Vec<LoanId> = Vec::new();

    for loan in &loans {
        let outcome = session.process(loan)?;
        match outcome.assignment {
            Some(record) => assignments.push(record),
            None => unassigned_loan_ids.push(loan.id),
        }
        if input.include_rejections {
            rejections.extend(outcome.rejections);
        }
    }

    let summary = session.finish();

    for loan_id in &unassigned_loan_ids {
        warnings.push(format!("Loan {} could not be assigned to any facility.", loan_id));
    }
    for facility_id in &summary.idle_facility_ids {
        warnings.push(format!("Facility {} accepted no loans.", facility_id));
    }

    let output = AllocationOutput {
        assigned_count: summary.assigned_count,
        assignments,
        yields: summary.yields,
        total_expected_yield: summary.total_expected_yield,
        unassigned_loan_ids,
        remaining_capacity: summary.remaining_capacity,
        rejections: input.include_rejections.then_some(rejections),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "bank_count": input.banks.len(),
        "facility_count": input.facilities.len(),
        "covenant_count": input.covenants.len(),
        "loan_count": input.loans.len(),
        "facility_order": "ascending interest rate, ties in load order",
        "yield_rounding": "truncated to 2 decimal places at report time",
    });

    Ok(with_metadata(
        "Greedy first-fit loan allocation with covenant screening",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

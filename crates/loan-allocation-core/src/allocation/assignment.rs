use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Rejection;
use crate::lending::{Bank, Covenanted, Facility, Loan};
use crate::types::{BankId, FacilityId, Money, Rate};
use crate::{LoanAllocationError, LoanAllocationResult};

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// A loan bound to a facility. Only exists for accepted loans.
///
/// Holds a snapshot of the facility's price at binding time; yield is
/// computed from that snapshot, never from later facility state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    loan: Loan,
    facility_id: FacilityId,
    bank_id: BankId,
    facility_interest_rate: Rate,
}

impl Assignment {
    /// Pure eligibility check: the facility's own covenants and capacity,
    /// then the owning bank's covenants.
    pub fn check(loan: &Loan, facility: &Facility, bank: &Bank) -> Result<(), Rejection> {
        debug_assert_eq!(facility.bank_id(), bank.id(), "facility checked against a foreign bank");
        facility.check_eligible(loan)?;
        bank.check_eligible(loan)?;
        Ok(())
    }

    /// Bind `loan` to `facility`. Capacity is debited only once every check
    /// has passed; on rejection nothing is mutated.
    pub fn try_new(loan: &Loan, facility: &mut Facility, bank: &Bank) -> Result<Self, Rejection> {
        Assignment::check(loan, facility, bank)?;

        facility.debit(loan.amount);

        Ok(Assignment {
            loan: loan.clone(),
            facility_id: facility.id(),
            bank_id: bank.id(),
            facility_interest_rate: facility.interest_rate(),
        })
    }

    pub fn loan(&self) -> &Loan {
        &self.loan
    }

    pub fn facility_id(&self) -> FacilityId {
        self.facility_id
    }

    pub fn bank_id(&self) -> BankId {
        self.bank_id
    }

    pub fn facility_interest_rate(&self) -> Rate {
        self.facility_interest_rate
    }

    /// Expected repayment income, less expected default loss, less the
    /// facility's cost of capital, all on the loan principal:
    ///
    /// `(1 - p) * r_loan * A - p * A - r_facility * A`
    ///
    /// Fails only when an intermediate value leaves the decimal range.
    pub fn expected_yield(&self) -> LoanAllocationResult<Money> {
        let p = self.loan.default_likelihood;
        let amount = self.loan.amount;
        let overflow = || LoanAllocationError::InvalidInput {
            field: format!("loans[{}]", self.loan.id),
            reason: "Expected yield exceeds the decimal range".into(),
        };

        let repayment_value = (Decimal::ONE - p)
            .checked_mul(self.loan.interest_rate)
            .and_then(|v| v.checked_mul(amount))
            .ok_or_else(overflow)?;
        let default_value = p.checked_mul(amount).ok_or_else(overflow)?;
        let facility_interest = self
            .facility_interest_rate
            .checked_mul(amount)
            .ok_or_else(overflow)?;

        repayment_value
            .checked_sub(default_value)
            .and_then(|v| v.checked_sub(facility_interest))
            .ok_or_else(overflow)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Plain reference and loan records, and the builder that turns them into a
//! [`LenderBook`].
//!
//! Records mirror the dataset columns one-to-one so that any reader (CSV,
//! JSON, bindings) can deserialise straight into them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::lending::{Covenant, CovenantTarget, LenderBook, Loan};
use crate::types::{BankId, FacilityId, LoanId, Money, Probability, Rate};
use crate::{LoanAllocationError, LoanAllocationResult};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankRecord {
    pub id: BankId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityRecord {
    pub id: FacilityId,
    pub amount: Money,
    pub interest_rate: Rate,
    pub bank_id: BankId,
}

/// A covenant row. When `facility_id` is set the covenant belongs to that
/// facility; otherwise it belongs to `bank_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CovenantRecord {
    #[serde(default)]
    pub bank_id: Option<BankId>,
    #[serde(default)]
    pub facility_id: Option<FacilityId>,
    #[serde(default)]
    pub max_default_likelihood: Option<Probability>,
    #[serde(default)]
    pub banned_state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub id: LoanId,
    pub interest_rate: Rate,
    pub amount: Money,
    pub default_likelihood: Probability,
    pub state: String,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl CovenantRecord {
    pub fn target(&self) -> LoanAllocationResult<CovenantTarget> {
        match (self.facility_id, self.bank_id) {
            (Some(facility_id), _) => Ok(CovenantTarget::Facility(facility_id)),
            (None, Some(bank_id)) => Ok(CovenantTarget::Bank(bank_id)),
            (None, None) => Err(LoanAllocationError::InvalidInput {
                field: "covenants".into(),
                reason: "Covenant must reference a bank_id or a facility_id".into(),
            }),
        }
    }

    pub fn to_covenant(&self) -> LoanAllocationResult<Covenant> {
        Ok(Covenant::new(
            self.target()?,
            self.max_default_likelihood,
            self.banned_state.clone(),
        ))
    }
}

impl TryFrom<LoanRecord> for Loan {
    type Error = LoanAllocationError;

    fn try_from(record: LoanRecord) -> LoanAllocationResult<Self> {
        if record.default_likelihood < Decimal::ZERO || record.default_likelihood > Decimal::ONE {
            return Err(LoanAllocationError::InvalidInput {
                field: format!("loans[{}].default_likelihood", record.id),
                reason: format!(
                    "Default likelihood {} must lie in [0, 1]",
                    record.default_likelihood
                ),
            });
        }
        if record.amount < Decimal::ZERO {
            return Err(LoanAllocationError::InvalidInput {
                field: format!("loans[{}].amount", record.id),
                reason: "Loan amount must be non-negative".into(),
            });
        }

        Ok(Loan {
            id: record.id,
            interest_rate: record.interest_rate,
            amount: record.amount,
            default_likelihood: record.default_likelihood,
            state: record.state.trim().to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Build the lender book: banks first, then facilities under their banks,
/// then covenants folded into their targets. Referential problems are
/// reported before any loan is seen.
pub fn build_lenders(
    banks: &[BankRecord],
    facilities: &[FacilityRecord],
    covenants: &[CovenantRecord],
) -> LoanAllocationResult<LenderBook> {
    let mut book = LenderBook::new();

    for record in banks {
        book.add_bank(record.id, &record.name)?;
    }

    for record in facilities {
        book.open_facility(record.bank_id, record.id, record.amount, record.interest_rate)?;
    }

    for record in covenants {
        book.attach_covenant(record.to_covenant()?)?;
    }

    tracing::debug!(
        banks = book.banks().len(),
        facilities = book.facilities().len(),
        covenants = covenants.len(),
        "lender book built"
    );

    Ok(book)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{BankId, FacilityId, LoanId};

#[derive(Debug, Error)]
pub enum LoanAllocationError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("{referrer} references unknown bank {bank_id}")]
    UnknownBank { referrer: String, bank_id: BankId },

    #[error("Covenant references unknown facility {0}")]
    UnknownFacility(FacilityId),

    #[error("Duplicate {entity} id {id}")]
    DuplicateId { entity: &'static str, id: u64 },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for LoanAllocationError {
    fn from(e: serde_json::Error) -> Self {
        LoanAllocationError::SerializationError(e.to_string())
    }
}

/// Why a single (loan, facility) pairing was declined.
///
/// Rejections are local to one pairing: the assignment scan records them and
/// moves on to the next facility. They never abort a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("{entity} has banned {state}")]
    BannedJurisdiction { entity: String, state: String },

    #[error("{entity}'s max default likelihood ({cap}) is exceeded by loan {loan_id}'s likelihood of {likelihood}")]
    DefaultLikelihoodExceeded {
        entity: String,
        cap: Decimal,
        loan_id: LoanId,
        likelihood: Decimal,
    },

    #[error("Facility {facility_id} ({remaining}) cannot fund loan {loan_id} ({requested})")]
    InsufficientCapacity {
        facility_id: FacilityId,
        remaining: Decimal,
        loan_id: LoanId,
        requested: Decimal,
    },
}

impl Rejection {
    /// Short machine-readable tag, used in diagnostic output.
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::BannedJurisdiction { .. } => "banned_jurisdiction",
            Rejection::DefaultLikelihoodExceeded { .. } => "default_likelihood_exceeded",
            Rejection::InsufficientCapacity { .. } => "insufficient_capacity",
        }
    }

    /// Whether the rejection came from a covenant rather than from capacity.
    pub fn is_eligibility(&self) -> bool {
        !matches!(self, Rejection::InsufficientCapacity { .. })
    }
}

use serde::{Deserialize, Serialize};

use crate::types::{LoanId, Money, Probability, Rate, StateCode};

/// A loan record as it arrives on the stream. Never mutated once read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub interest_rate: Rate,
    pub amount: Money,
    /// Probability of default, in [0, 1].
    pub default_likelihood: Probability,
    /// Jurisdiction code the loan was originated in.
    pub state: StateCode,
}

impl Loan {
    pub fn new(
        id: LoanId,
        interest_rate: Rate,
        amount: Money,
        default_likelihood: Probability,
        state: &str,
    ) -> Self {
        Loan {
            id,
            interest_rate,
            amount,
            default_likelihood,
            state: state.to_string(),
        }
    }
}

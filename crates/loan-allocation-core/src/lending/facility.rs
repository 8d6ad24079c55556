use serde::{Deserialize, Serialize};

use super::covenant::{Covenant, CovenantRuleSet, Covenanted};
use super::loan::Loan;
use crate::error::Rejection;
use crate::types::{BankId, FacilityId, Money, Rate};

/// A priced pool of lending capacity belonging to exactly one bank.
///
/// `amount` is the remaining capacity. It only moves through `debit`,
/// which the assignment step calls after every check has passed, so it can
/// never go below zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    id: FacilityId,
    bank_id: BankId,
    interest_rate: Rate,
    initial_amount: Money,
    amount: Money,
    rules: CovenantRuleSet,
    covenants: Vec<Covenant>,
}

impl Facility {
    /// Facilities are opened through the lender book so that the owning
    /// bank is recorded exactly once.
    pub(crate) fn new(id: FacilityId, bank_id: BankId, amount: Money, interest_rate: Rate) -> Self {
        Facility {
            id,
            bank_id,
            interest_rate,
            initial_amount: amount,
            amount,
            rules: CovenantRuleSet::new(),
            covenants: Vec::new(),
        }
    }

    pub fn id(&self) -> FacilityId {
        self.id
    }

    pub fn bank_id(&self) -> BankId {
        self.bank_id
    }

    pub fn interest_rate(&self) -> Rate {
        self.interest_rate
    }

    pub fn remaining_capacity(&self) -> Money {
        self.amount
    }

    pub fn initial_capacity(&self) -> Money {
        self.initial_amount
    }

    /// Sum of the amounts of every loan this facility has accepted.
    pub fn committed(&self) -> Money {
        self.initial_amount - self.amount
    }

    /// Covenants attached directly to this facility, in attachment order.
    pub fn covenants(&self) -> &[Covenant] {
        &self.covenants
    }

    pub(crate) fn debit(&mut self, amount: Money) {
        debug_assert!(amount <= self.amount, "debit exceeds remaining capacity");
        self.amount -= amount;
    }
}

impl Covenanted for Facility {
    fn identifier(&self) -> String {
        format!("Facility {}", self.id)
    }

    fn rules(&self) -> &CovenantRuleSet {
        &self.rules
    }

    fn rules_mut(&mut self) -> &mut CovenantRuleSet {
        &mut self.rules
    }

    fn attach(&mut self, covenant: Covenant) {
        self.rules.attach(&covenant);
        self.covenants.push(covenant);
    }

    /// Covenant checks first, capacity last.
    fn check_eligible(&self, loan: &Loan) -> Result<(), Rejection> {
        self.rules.check_eligible(&self.identifier(), loan)?;

        if loan.amount > self.amount {
            return Err(Rejection::InsufficientCapacity {
                facility_id: self.id,
                remaining: self.amount,
                loan_id: loan.id,
                requested: loan.amount,
            });
        }

        Ok(())
    }
}

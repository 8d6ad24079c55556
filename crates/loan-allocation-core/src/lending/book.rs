use std::collections::HashMap;

use rust_decimal::Decimal;

use super::bank::Bank;
use super::covenant::{Covenant, CovenantTarget, Covenanted};
use super::facility::Facility;
use crate::types::{BankId, FacilityId, Money, Rate};
use crate::{LoanAllocationError, LoanAllocationResult};

/// Owning container for every bank and facility in a run.
///
/// Banks list their facilities by id; each facility keeps its bank's id as a
/// back-reference. Lookups go through the slot indexes below.
#[derive(Debug, Clone, Default)]
pub struct LenderBook {
    banks: Vec<Bank>,
    facilities: Vec<Facility>,
    bank_slots: HashMap<BankId, usize>,
    facility_slots: HashMap<FacilityId, usize>,
}

impl LenderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_bank(&mut self, id: BankId, name: &str) -> LoanAllocationResult<&mut Bank> {
        if self.bank_slots.contains_key(&id) {
            return Err(LoanAllocationError::DuplicateId { entity: "bank", id });
        }
        let slot = self.banks.len();
        self.banks.push(Bank::new(id, name));
        self.bank_slots.insert(id, slot);
        Ok(&mut self.banks[slot])
    }

    /// Open a facility under an existing bank.
    pub fn open_facility(
        &mut self,
        bank_id: BankId,
        id: FacilityId,
        amount: Money,
        interest_rate: Rate,
    ) -> LoanAllocationResult<&mut Facility> {
        let bank_slot = *self
            .bank_slots
            .get(&bank_id)
            .ok_or_else(|| LoanAllocationError::UnknownBank {
                referrer: format!("Facility {}", id),
                bank_id,
            })?;
        if self.facility_slots.contains_key(&id) {
            return Err(LoanAllocationError::DuplicateId { entity: "facility", id });
        }
        if amount < Decimal::ZERO {
            return Err(LoanAllocationError::InvalidInput {
                field: format!("facilities[{}].amount", id),
                reason: "Facility amount must be non-negative".into(),
            });
        }
        if interest_rate < Decimal::ZERO {
            return Err(LoanAllocationError::InvalidInput {
                field: format!("facilities[{}].interest_rate", id),
                reason: "Facility interest rate must be non-negative".into(),
            });
        }

        self.banks[bank_slot].add_facility(id);
        let slot = self.facilities.len();
        self.facilities
            .push(Facility::new(id, bank_id, amount, interest_rate));
        self.facility_slots.insert(id, slot);
        Ok(&mut self.facilities[slot])
    }

    /// Route a covenant to the entity it targets and fold it in.
    pub fn attach_covenant(&mut self, covenant: Covenant) -> LoanAllocationResult<()> {
        if let Some(cap) = covenant.max_default_likelihood {
            if cap < Decimal::ZERO || cap > Decimal::ONE {
                return Err(LoanAllocationError::InvalidInput {
                    field: "covenants.max_default_likelihood".into(),
                    reason: format!("Cap {} must lie in [0, 1]", cap),
                });
            }
        }

        match covenant.target {
            CovenantTarget::Facility(id) => {
                let slot = *self
                    .facility_slots
                    .get(&id)
                    .ok_or(LoanAllocationError::UnknownFacility(id))?;
                self.facilities[slot].attach(covenant);
            }
            CovenantTarget::Bank(id) => {
                let slot = *self
                    .bank_slots
                    .get(&id)
                    .ok_or_else(|| LoanAllocationError::UnknownBank {
                        referrer: "Covenant".into(),
                        bank_id: id,
                    })?;
                self.banks[slot].attach(covenant);
            }
        }
        Ok(())
    }

    pub fn bank(&self, id: BankId) -> Option<&Bank> {
        self.bank_slots.get(&id).map(|&slot| &self.banks[slot])
    }

    pub fn facility(&self, id: FacilityId) -> Option<&Facility> {
        self.facility_slots.get(&id).map(|&slot| &self.facilities[slot])
    }

    /// Banks in load order.
    pub fn banks(&self) -> &[Bank] {
        &self.banks
    }

    /// Facilities in load order.
    pub fn facilities(&self) -> &[Facility] {
        &self.facilities
    }

    /// A bank's facilities, in the order they were opened.
    pub fn facilities_of(&self, bank_id: BankId) -> impl Iterator<Item = &Facility> + '_ {
        self.bank(bank_id)
            .map(|bank| bank.facility_ids())
            .unwrap_or(&[])
            .iter()
            .filter_map(move |id| self.facility(*id))
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }

    /// Mutable facility at `slot` together with its owning bank.
    pub(crate) fn pair_at_mut(&mut self, slot: usize) -> (&mut Facility, &Bank) {
        let facility = &mut self.facilities[slot];
        // Every facility was opened under a registered bank.
        let bank = &self.banks[self.bank_slots[&facility.bank_id()]];
        (facility, bank)
    }
}

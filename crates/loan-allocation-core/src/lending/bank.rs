use serde::{Deserialize, Serialize};

use super::covenant::{CovenantRuleSet, Covenanted};
use crate::types::{BankId, FacilityId};

/// A lender. Owns an ordered list of facilities (by id, in creation order);
/// its rule set applies to every loan proposed to any of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bank {
    id: BankId,
    name: String,
    facility_ids: Vec<FacilityId>,
    rules: CovenantRuleSet,
}

impl Bank {
    pub fn new(id: BankId, name: &str) -> Self {
        Bank {
            id,
            name: name.to_string(),
            facility_ids: Vec::new(),
            rules: CovenantRuleSet::new(),
        }
    }

    pub fn id(&self) -> BankId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ids of owned facilities, in the order they were opened.
    pub fn facility_ids(&self) -> &[FacilityId] {
        &self.facility_ids
    }

    pub(crate) fn add_facility(&mut self, facility_id: FacilityId) {
        self.facility_ids.push(facility_id);
    }
}

impl Covenanted for Bank {
    fn identifier(&self) -> String {
        format!("Bank {}", self.id)
    }

    fn rules(&self) -> &CovenantRuleSet {
        &self.rules
    }

    fn rules_mut(&mut self) -> &mut CovenantRuleSet {
        &mut self.rules
    }
}

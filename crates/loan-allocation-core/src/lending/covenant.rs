use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::loan::Loan;
use crate::error::Rejection;
use crate::types::{BankId, FacilityId, Probability, StateCode};

// ---------------------------------------------------------------------------
// Covenant
// ---------------------------------------------------------------------------

/// The single entity a covenant restricts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CovenantTarget {
    Bank(BankId),
    Facility(FacilityId),
}

/// An immutable lending restriction. Either payload may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Covenant {
    pub target: CovenantTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_default_likelihood: Option<Probability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banned_state: Option<StateCode>,
}

impl Covenant {
    /// Build a covenant. A blank banned state is treated as no ban.
    pub fn new(
        target: CovenantTarget,
        max_default_likelihood: Option<Probability>,
        banned_state: Option<StateCode>,
    ) -> Self {
        let banned_state = banned_state
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Covenant {
            target,
            max_default_likelihood,
            banned_state,
        }
    }

    pub fn banning(target: CovenantTarget, state: &str) -> Self {
        Covenant::new(target, None, Some(state.to_string()))
    }

    pub fn capping(target: CovenantTarget, max_default_likelihood: Probability) -> Self {
        Covenant::new(target, Some(max_default_likelihood), None)
    }
}

// ---------------------------------------------------------------------------
// Rule set
// ---------------------------------------------------------------------------

/// The folded effect of every covenant attached to one entity.
///
/// The banned set only grows (union) and the cap only shrinks (min), so the
/// result does not depend on the order covenants are attached in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CovenantRuleSet {
    banned_states: BTreeSet<StateCode>,
    max_default_likelihood: Option<Probability>,
}

impl CovenantRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, covenant: &Covenant) {
        if let Some(cap) = covenant.max_default_likelihood {
            self.max_default_likelihood = Some(match self.max_default_likelihood {
                Some(current) => current.min(cap),
                None => cap,
            });
        }

        if let Some(ref state) = covenant.banned_state {
            self.banned_states.insert(state.clone());
        }
    }

    pub fn banned_states(&self) -> &BTreeSet<StateCode> {
        &self.banned_states
    }

    pub fn max_default_likelihood(&self) -> Option<Probability> {
        self.max_default_likelihood
    }

    pub fn is_banned(&self, state: &str) -> bool {
        self.banned_states.contains(state)
    }

    /// True when no covenant has contributed anything.
    pub fn is_unconstrained(&self) -> bool {
        self.banned_states.is_empty() && self.max_default_likelihood.is_none()
    }

    /// Check a loan against the banned set, then against the cap. A loan
    /// sitting exactly on the cap passes.
    pub fn check_eligible(&self, entity: &str, loan: &Loan) -> Result<(), Rejection> {
        if self.is_banned(&loan.state) {
            return Err(Rejection::BannedJurisdiction {
                entity: entity.to_string(),
                state: loan.state.clone(),
            });
        }

        if let Some(cap) = self.max_default_likelihood {
            if loan.default_likelihood > cap {
                return Err(Rejection::DefaultLikelihoodExceeded {
                    entity: entity.to_string(),
                    cap,
                    loan_id: loan.id,
                    likelihood: loan.default_likelihood,
                });
            }
        }

        Ok(())
    }
}

impl<'a> Extend<&'a Covenant> for CovenantRuleSet {
    fn extend<I: IntoIterator<Item = &'a Covenant>>(&mut self, iter: I) {
        for covenant in iter {
            self.attach(covenant);
        }
    }
}

impl<'a> FromIterator<&'a Covenant> for CovenantRuleSet {
    fn from_iter<I: IntoIterator<Item = &'a Covenant>>(iter: I) -> Self {
        let mut rules = CovenantRuleSet::new();
        rules.extend(iter);
        rules
    }
}

// ---------------------------------------------------------------------------
// Shared capability
// ---------------------------------------------------------------------------

/// Behaviour shared by every entity that carries covenants.
pub trait Covenanted {
    /// Human-readable label used in rejection messages, e.g. "Bank 3".
    fn identifier(&self) -> String;

    fn rules(&self) -> &CovenantRuleSet;

    fn rules_mut(&mut self) -> &mut CovenantRuleSet;

    /// Fold a covenant into this entity's rule set.
    fn attach(&mut self, covenant: Covenant) {
        self.rules_mut().attach(&covenant);
    }

    fn check_eligible(&self, loan: &Loan) -> Result<(), Rejection> {
        self.rules().check_eligible(&self.identifier(), loan)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    const TARGET: CovenantTarget = CovenantTarget::Bank(1);

    fn loan(state: &str, default_likelihood: Probability) -> Loan {
        Loan::new(7, dec!(0.1), dec!(1000), default_likelihood, state)
    }

    #[test]
    fn test_new_rule_set_is_unconstrained() {
        let rules = CovenantRuleSet::new();
        assert!(rules.banned_states().is_empty());
        assert_eq!(rules.max_default_likelihood(), None);
        assert!(rules.is_unconstrained());
        assert!(rules.check_eligible("t", &loan("NY", dec!(0.2))).is_ok());
    }

    #[test]
    fn test_banned_states_accumulate_as_union() {
        let mut rules = CovenantRuleSet::new();
        let steps: Vec<(Option<&str>, Vec<&str>)> = vec![
            (None, vec![]),
            (Some("NY"), vec!["NY"]),
            (Some("NY"), vec!["NY"]),
            (Some("CT"), vec!["CT", "NY"]),
            (Some("CA"), vec!["CA", "CT", "NY"]),
        ];

        for (state, expected) in steps {
            rules.attach(&Covenant::new(TARGET, None, state.map(String::from)));
            let actual: Vec<&str> = rules.banned_states().iter().map(String::as_str).collect();
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn test_cap_tracks_minimum_of_covenants() {
        let mut rules = CovenantRuleSet::new();
        let steps = [
            (Some(dec!(0.08)), dec!(0.08)),
            (Some(dec!(0.05)), dec!(0.05)),
            (Some(dec!(0.06)), dec!(0.05)),
            (None, dec!(0.05)),
            (Some(dec!(0.04)), dec!(0.04)),
            (Some(dec!(0.14)), dec!(0.04)),
        ];

        for (cap, expected) in steps {
            rules.attach(&Covenant::new(TARGET, cap, None));
            assert_eq!(rules.max_default_likelihood(), Some(expected));
        }
    }

    #[test]
    fn test_zero_cap_is_a_real_cap() {
        let rules: CovenantRuleSet = [Covenant::capping(TARGET, dec!(0))].iter().collect();
        assert_eq!(rules.max_default_likelihood(), Some(dec!(0)));
        assert!(rules.check_eligible("t", &loan("TX", dec!(0.01))).is_err());
        assert!(rules.check_eligible("t", &loan("TX", dec!(0))).is_ok());
    }

    #[test]
    fn test_blank_banned_state_is_ignored() {
        let covenant = Covenant::new(TARGET, None, Some("  ".into()));
        assert_eq!(covenant.banned_state, None);
        let rules: CovenantRuleSet = [covenant].iter().collect();
        assert!(rules.is_unconstrained());
    }

    #[test]
    fn test_covenant_with_both_payloads() {
        let covenant = Covenant::new(TARGET, Some(dec!(0.1)), Some("NV".into()));
        let rules: CovenantRuleSet = [covenant].iter().collect();
        assert!(rules.is_banned("NV"));
        assert_eq!(rules.max_default_likelihood(), Some(dec!(0.1)));
    }

    #[test]
    fn test_permutations_yield_identical_rule_sets() {
        let covenants = vec![
            Covenant::banning(TARGET, "NY"),
            Covenant::capping(TARGET, dec!(0.09)),
            Covenant::new(TARGET, Some(dec!(0.03)), Some("CT".into())),
            Covenant::banning(TARGET, "NY"),
            Covenant::capping(TARGET, dec!(0.2)),
        ];
        let baseline: CovenantRuleSet = covenants.iter().collect();

        // Every rotation of both the forward and reversed order.
        let mut reversed = covenants.clone();
        reversed.reverse();
        for order in [covenants, reversed] {
            for shift in 0..order.len() {
                let mut rotated = order.clone();
                rotated.rotate_left(shift);
                let rules: CovenantRuleSet = rotated.iter().collect();
                assert_eq!(rules, baseline);
            }
        }

        assert_eq!(baseline.max_default_likelihood(), Some(dec!(0.03)));
        assert_eq!(baseline.banned_states().len(), 2);
    }

    #[test]
    fn test_check_allows_loan_within_covenants() {
        let mut rules = CovenantRuleSet::new();
        rules.attach(&Covenant::banning(TARGET, "CT"));
        rules.attach(&Covenant::capping(TARGET, dec!(0.3)));
        assert!(rules.check_eligible("t", &loan("NY", dec!(0.2))).is_ok());
    }

    #[test]
    fn test_check_rejects_banned_state() {
        let rules: CovenantRuleSet = [Covenant::banning(TARGET, "NY")].iter().collect();
        let err = rules.check_eligible("Bank 1", &loan("NY", dec!(0.2))).unwrap_err();
        assert_eq!(
            err,
            Rejection::BannedJurisdiction {
                entity: "Bank 1".into(),
                state: "NY".into(),
            }
        );
    }

    #[test]
    fn test_check_rejects_likelihood_above_cap() {
        let rules: CovenantRuleSet = [Covenant::capping(TARGET, dec!(0.15))].iter().collect();
        let err = rules.check_eligible("t", &loan("NY", dec!(0.2))).unwrap_err();
        assert_eq!(err.kind(), "default_likelihood_exceeded");
    }

    #[test]
    fn test_check_allows_likelihood_equal_to_cap() {
        let rules: CovenantRuleSet = [Covenant::capping(TARGET, dec!(0.2))].iter().collect();
        assert!(rules.check_eligible("t", &loan("NY", dec!(0.2))).is_ok());
    }

    #[test]
    fn test_banned_state_reported_before_cap() {
        let covenant = Covenant::new(TARGET, Some(dec!(0.01)), Some("NY".into()));
        let rules: CovenantRuleSet = [covenant].iter().collect();
        let err = rules.check_eligible("t", &loan("NY", dec!(0.5))).unwrap_err();
        assert_eq!(err.kind(), "banned_jurisdiction");
    }
}

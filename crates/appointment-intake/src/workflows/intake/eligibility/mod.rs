mod config;
mod rules;

pub use config::{AgeBand, EligibilityPolicy, PolicyLoadError, SpecialtyRestriction};
pub use rules::EligibilityRule;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::age::age_on;
use super::domain::{Doctor, PatientCriteria};
use rules::RuleContext;

/// Stateless engine narrowing a roster to the doctors a patient may select.
#[derive(Debug, Clone, Default)]
pub struct EligibilityEngine {
    policy: EligibilityPolicy,
}

impl EligibilityEngine {
    pub fn new(policy: EligibilityPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &EligibilityPolicy {
        &self.policy
    }

    /// Filter against today's local date.
    pub fn filter(&self, roster: &[Doctor], criteria: &PatientCriteria) -> Vec<Doctor> {
        self.filter_on(roster, criteria, Local::now().date_naive())
    }

    pub fn filter_on(
        &self,
        roster: &[Doctor],
        criteria: &PatientCriteria,
        today: NaiveDate,
    ) -> Vec<Doctor> {
        self.evaluate(roster, criteria, today).doctors
    }

    /// Run the default pipeline and keep a per-rule trace.
    pub fn evaluate(
        &self,
        roster: &[Doctor],
        criteria: &PatientCriteria,
        today: NaiveDate,
    ) -> FilterOutcome {
        self.evaluate_in_order(roster, criteria, today, &EligibilityRule::PIPELINE)
    }

    /// Run the given rules in the given order. Inactive rules are skipped.
    pub fn evaluate_in_order(
        &self,
        roster: &[Doctor],
        criteria: &PatientCriteria,
        today: NaiveDate,
        order: &[EligibilityRule],
    ) -> FilterOutcome {
        let age = criteria.birth_date.map(|birth_date| age_on(birth_date, today));
        let ctx = RuleContext::new(&self.policy, criteria, age);

        let mut doctors: Vec<Doctor> = roster.to_vec();
        let mut applied = Vec::new();

        for &rule in order {
            if !rule.is_active(&ctx) {
                continue;
            }
            let before = doctors.len();
            doctors.retain(|doctor| rule.admits(doctor, &ctx));
            debug!(
                rule = rule.label(),
                before,
                after = doctors.len(),
                "eligibility rule applied"
            );
            applied.push(RuleTrace {
                rule,
                remaining: doctors.len(),
            });
        }

        FilterOutcome {
            age,
            doctors,
            applied,
        }
    }
}

/// Count of doctors left after a rule ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTrace {
    pub rule: EligibilityRule,
    pub remaining: usize,
}

/// Filtered roster together with the audit trail that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOutcome {
    pub age: Option<i32>,
    pub doctors: Vec<Doctor>,
    pub applied: Vec<RuleTrace>,
}

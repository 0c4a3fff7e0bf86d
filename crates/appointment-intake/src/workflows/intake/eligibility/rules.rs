use serde::{Deserialize, Serialize};

use super::super::domain::{CityId, Doctor, Gender, PatientCriteria, SpecialtyId};
use super::config::EligibilityPolicy;

/// Inputs shared by every rule for one filtering pass.
pub(crate) struct RuleContext<'a> {
    pub policy: &'a EligibilityPolicy,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub city_id: Option<&'a CityId>,
    pub speciality_id: Option<&'a SpecialtyId>,
}

impl<'a> RuleContext<'a> {
    pub fn new(policy: &'a EligibilityPolicy, criteria: &'a PatientCriteria, age: Option<i32>) -> Self {
        Self {
            policy,
            age,
            gender: criteria.gender,
            city_id: present(criteria.city_id.as_ref()),
            speciality_id: present(criteria.speciality_id.as_ref()),
        }
    }
}

/// Blank identifiers leave their rule switched off.
fn present<T: AsRef<str>>(id: Option<&T>) -> Option<&T> {
    id.filter(|id| !id.as_ref().trim().is_empty())
}

/// One narrowing step of the eligibility pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityRule {
    AgeBracket,
    Gender,
    City,
    Specialty,
}

impl EligibilityRule {
    /// Default evaluation order.
    pub const PIPELINE: [EligibilityRule; 4] = [
        EligibilityRule::AgeBracket,
        EligibilityRule::Gender,
        EligibilityRule::City,
        EligibilityRule::Specialty,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EligibilityRule::AgeBracket => "age bracket",
            EligibilityRule::Gender => "gender",
            EligibilityRule::City => "city",
            EligibilityRule::Specialty => "specialty",
        }
    }

    /// A rule only runs when the criterion it reads is present.
    pub(crate) fn is_active(self, ctx: &RuleContext<'_>) -> bool {
        match self {
            EligibilityRule::AgeBracket => ctx.age.is_some(),
            EligibilityRule::Gender => ctx.gender.is_some(),
            EligibilityRule::City => ctx.city_id.is_some(),
            EligibilityRule::Specialty => ctx.speciality_id.is_some(),
        }
    }

    pub(crate) fn admits(self, doctor: &Doctor, ctx: &RuleContext<'_>) -> bool {
        match self {
            EligibilityRule::AgeBracket => match ctx.age {
                Some(age) => admits_age(doctor, age, ctx.policy),
                None => true,
            },
            EligibilityRule::Gender => match ctx.gender {
                Some(gender) => doctor
                    .speciality_id
                    .as_ref()
                    .map_or(true, |speciality| ctx.policy.admits_gender(speciality, gender)),
                None => true,
            },
            EligibilityRule::City => match ctx.city_id {
                Some(city) => doctor.city_id.as_ref() == Some(city),
                None => true,
            },
            EligibilityRule::Specialty => match ctx.speciality_id {
                Some(speciality) => doctor.speciality_id.as_ref() == Some(speciality),
                None => true,
            },
        }
    }
}

fn admits_age(doctor: &Doctor, age: i32, policy: &EligibilityPolicy) -> bool {
    let wants_pediatrician = age < policy.pediatric_age_limit;
    if doctor.is_pediatrician != Some(wants_pediatrician) {
        return false;
    }

    doctor
        .speciality_id
        .as_ref()
        .map_or(true, |speciality| policy.admits_age(speciality, age))
}

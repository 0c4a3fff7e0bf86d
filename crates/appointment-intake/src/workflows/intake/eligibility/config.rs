use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::super::domain::{Gender, SpecialtyId};

/// Policy table driving the eligibility rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityPolicy {
    /// Patients younger than this only see pediatricians.
    pub pediatric_age_limit: i32,
    pub specialty_restrictions: Vec<SpecialtyRestriction>,
}

/// Demographic restriction attached to a single specialty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialtyRestriction {
    pub speciality_id: SpecialtyId,
    /// Only patients of this gender may be routed to the specialty.
    #[serde(default)]
    pub restricted_to_gender: Option<Gender>,
    /// Patients whose age falls inside the band are not routed to the specialty.
    #[serde(default)]
    pub excluded_age_band: Option<AgeBand>,
}

/// Half-open age interval `[from, until)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBand {
    pub from: i32,
    pub until: i32,
}

impl AgeBand {
    pub fn contains(&self, age: i32) -> bool {
        self.from <= age && age < self.until
    }
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        let gendered = |id: &str, gender| SpecialtyRestriction {
            speciality_id: SpecialtyId::new(id),
            restricted_to_gender: Some(gender),
            excluded_age_band: None,
        };

        Self {
            pediatric_age_limit: 16,
            specialty_restrictions: vec![
                gendered("2", Gender::Female),
                gendered("9", Gender::Female),
                gendered("3", Gender::Male),
                gendered("8", Gender::Male),
                SpecialtyRestriction {
                    speciality_id: SpecialtyId::new("12"),
                    restricted_to_gender: None,
                    excluded_age_band: Some(AgeBand {
                        from: 16,
                        until: 45,
                    }),
                },
            ],
        }
    }
}

impl EligibilityPolicy {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PolicyLoadError> {
        let raw = fs::read_to_string(path)?;
        let policy: Self = serde_json::from_str(&raw)?;
        policy.check_unique_specialties()?;
        Ok(policy)
    }

    /// Each specialty may appear in at most one restriction row.
    pub fn check_unique_specialties(&self) -> Result<(), PolicyLoadError> {
        let mut seen = HashSet::new();
        for restriction in &self.specialty_restrictions {
            if !seen.insert(&restriction.speciality_id) {
                return Err(PolicyLoadError::DuplicateSpecialty(
                    restriction.speciality_id.clone(),
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn restriction(&self, speciality_id: &SpecialtyId) -> Option<&SpecialtyRestriction> {
        self.specialty_restrictions
            .iter()
            .find(|restriction| &restriction.speciality_id == speciality_id)
    }

    /// Whether a patient of `gender` may be routed to `speciality_id`.
    pub(crate) fn admits_gender(&self, speciality_id: &SpecialtyId, gender: Gender) -> bool {
        match self
            .restriction(speciality_id)
            .and_then(|restriction| restriction.restricted_to_gender)
        {
            Some(required) => required == gender,
            None => true,
        }
    }

    /// Whether a patient of `age` may be routed to `speciality_id`.
    pub(crate) fn admits_age(&self, speciality_id: &SpecialtyId, age: i32) -> bool {
        match self
            .restriction(speciality_id)
            .and_then(|restriction| restriction.excluded_age_band)
        {
            Some(band) => !band.contains(age),
            None => true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PolicyLoadError {
    #[error("failed to read eligibility policy: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid eligibility policy: {0}")]
    Json(#[from] serde_json::Error),
    #[error("specialty {0} has more than one restriction row")]
    DuplicateSpecialty(SpecialtyId),
}

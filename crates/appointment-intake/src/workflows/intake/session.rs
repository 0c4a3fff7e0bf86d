use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::catalog::ReferenceCatalogs;
use super::domain::{
    optional_date, optional_gender, optional_identifier, CityId, CriteriaPatch, Doctor, DoctorId,
    Gender, PatientCriteria, SpecialtyId,
};
use super::eligibility::EligibilityEngine;
use super::sync::derive_patch;

/// Changes applied to the criteria held by an intake session.
///
/// Edits made by the patient clear the doctor selection. `CriteriaPatched` is
/// only produced by the selection synchronizer and never clears it, which is
/// what keeps a selection from undoing itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum IntakeEvent {
    BirthDateEdited(#[serde(deserialize_with = "optional_date")] Option<NaiveDate>),
    GenderEdited(#[serde(deserialize_with = "optional_gender")] Option<Gender>),
    CityEdited(#[serde(deserialize_with = "optional_identifier")] Option<CityId>),
    SpecialtyEdited(#[serde(deserialize_with = "optional_identifier")] Option<SpecialtyId>),
    DoctorSelected(#[serde(deserialize_with = "optional_identifier")] Option<DoctorId>),
    CriteriaPatched(CriteriaPatch),
}

impl IntakeEvent {
    pub fn label(&self) -> &'static str {
        match self {
            IntakeEvent::BirthDateEdited(_) => "birth_date_edited",
            IntakeEvent::GenderEdited(_) => "gender_edited",
            IntakeEvent::CityEdited(_) => "city_edited",
            IntakeEvent::SpecialtyEdited(_) => "specialty_edited",
            IntakeEvent::DoctorSelected(_) => "doctor_selected",
            IntakeEvent::CriteriaPatched(_) => "criteria_patched",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("doctor {0} is not in the roster")]
    UnknownDoctor(DoctorId),
}

/// State after an event has been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub criteria: PatientCriteria,
    pub doctors: Vec<Doctor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<CriteriaPatch>,
}

struct Transition {
    criteria: PatientCriteria,
    patch: Option<CriteriaPatch>,
    refilter: bool,
}

impl Transition {
    fn user_edit(mut criteria: PatientCriteria) -> Self {
        criteria.selected_doctor_id = None;
        Self {
            criteria,
            patch: None,
            refilter: true,
        }
    }
}

fn non_empty<T: AsRef<str>>(value: Option<T>) -> Option<T> {
    value.filter(|inner| !inner.as_ref().trim().is_empty())
}

fn reduce(
    roster: &[Doctor],
    mut criteria: PatientCriteria,
    event: IntakeEvent,
) -> Result<Transition, IntakeError> {
    match event {
        IntakeEvent::BirthDateEdited(birth_date) => {
            criteria.birth_date = birth_date;
            Ok(Transition::user_edit(criteria))
        }
        IntakeEvent::GenderEdited(gender) => {
            criteria.gender = gender;
            Ok(Transition::user_edit(criteria))
        }
        IntakeEvent::CityEdited(city_id) => {
            criteria.city_id = non_empty(city_id);
            Ok(Transition::user_edit(criteria))
        }
        IntakeEvent::SpecialtyEdited(speciality_id) => {
            criteria.speciality_id = non_empty(speciality_id);
            Ok(Transition::user_edit(criteria))
        }
        IntakeEvent::DoctorSelected(selected) => match non_empty(selected) {
            None => {
                criteria.selected_doctor_id = None;
                Ok(Transition {
                    criteria,
                    patch: None,
                    refilter: false,
                })
            }
            Some(doctor_id) => {
                if !roster.iter().any(|doctor| doctor.id == doctor_id) {
                    return Err(IntakeError::UnknownDoctor(doctor_id));
                }

                let changed = criteria.selected_doctor_id.as_ref() != Some(&doctor_id);
                let patch = if changed {
                    derive_patch(roster, &doctor_id)
                } else {
                    None
                };
                criteria.selected_doctor_id = Some(doctor_id);

                match patch {
                    Some(patch) => {
                        let mut transition =
                            reduce(roster, criteria, IntakeEvent::CriteriaPatched(patch.clone()))?;
                        transition.patch = Some(patch);
                        Ok(transition)
                    }
                    None => Ok(Transition {
                        criteria,
                        patch: None,
                        refilter: false,
                    }),
                }
            }
        },
        IntakeEvent::CriteriaPatched(patch) => {
            criteria.city_id = Some(patch.city_id);
            criteria.speciality_id = Some(patch.speciality_id);
            Ok(Transition {
                criteria,
                patch: None,
                refilter: true,
            })
        }
    }
}

/// Apply one event to a criteria snapshot without keeping any state.
pub fn apply_event(
    catalogs: &ReferenceCatalogs,
    engine: &EligibilityEngine,
    criteria: PatientCriteria,
    event: IntakeEvent,
    today: NaiveDate,
) -> Result<DispatchOutcome, IntakeError> {
    let transition = reduce(&catalogs.doctors, criteria, event)?;
    let doctors = engine.filter_on(&catalogs.doctors, &transition.criteria, today);

    Ok(DispatchOutcome {
        criteria: transition.criteria,
        doctors,
        patch: transition.patch,
    })
}

/// Form controller owning the criteria and the filtered roster for one patient.
pub struct IntakeSession {
    catalogs: Arc<ReferenceCatalogs>,
    engine: Arc<EligibilityEngine>,
    criteria: PatientCriteria,
    doctors: Vec<Doctor>,
    today: NaiveDate,
}

impl IntakeSession {
    pub fn new(catalogs: Arc<ReferenceCatalogs>, engine: Arc<EligibilityEngine>) -> Self {
        Self::with_today(catalogs, engine, Local::now().date_naive())
    }

    /// Session evaluating ages against a fixed date.
    pub fn with_today(
        catalogs: Arc<ReferenceCatalogs>,
        engine: Arc<EligibilityEngine>,
        today: NaiveDate,
    ) -> Self {
        let doctors = catalogs.doctors.clone();
        Self {
            catalogs,
            engine,
            criteria: PatientCriteria::default(),
            doctors,
            today,
        }
    }

    pub fn criteria(&self) -> &PatientCriteria {
        &self.criteria
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    pub fn catalogs(&self) -> &ReferenceCatalogs {
        &self.catalogs
    }

    pub fn selected_doctor(&self) -> Option<&Doctor> {
        self.criteria
            .selected_doctor_id
            .as_ref()
            .and_then(|id| self.catalogs.doctor(id))
    }

    pub fn dispatch(&mut self, event: IntakeEvent) -> Result<DispatchOutcome, IntakeError> {
        let label = event.label();
        let transition = reduce(&self.catalogs.doctors, self.criteria.clone(), event)?;

        self.criteria = transition.criteria;
        if transition.refilter {
            self.doctors = self
                .engine
                .filter_on(&self.catalogs.doctors, &self.criteria, self.today);
        }

        debug!(
            event = label,
            eligible = self.doctors.len(),
            patched = transition.patch.is_some(),
            "intake event applied"
        );

        Ok(DispatchOutcome {
            criteria: self.criteria.clone(),
            doctors: self.doctors.clone(),
            patch: transition.patch,
        })
    }
}

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::catalog::ReferenceCatalogs;
use super::domain::{
    optional_date, optional_gender, optional_identifier, CityId, DoctorId, Gender,
    PatientCriteria, SpecialtyId,
};

/// Appointment request as posted by the intake form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "optional_date")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "optional_gender")]
    pub gender: Option<Gender>,
    #[serde(default, deserialize_with = "optional_identifier")]
    pub city_id: Option<CityId>,
    #[serde(default, deserialize_with = "optional_identifier")]
    pub speciality_id: Option<SpecialtyId>,
    #[serde(default, deserialize_with = "optional_identifier")]
    pub doctor_id: Option<DoctorId>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Request that passed validation; required fields are guaranteed present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedAppointment {
    pub name: String,
    pub birth_date: NaiveDate,
    pub gender: Gender,
    pub city_id: CityId,
    pub speciality_id: Option<SpecialtyId>,
    pub doctor_id: DoctorId,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ValidatedAppointment {
    /// Criteria the doctor choice must satisfy.
    pub fn criteria(&self) -> PatientCriteria {
        PatientCriteria {
            birth_date: Some(self.birth_date),
            gender: Some(self.gender),
            city_id: Some(self.city_id.clone()),
            speciality_id: self.speciality_id.clone(),
            selected_doctor_id: Some(self.doctor_id.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationRule {
    Required,
    InvalidName,
    InvalidEmail,
    InvalidPhone,
    PhoneTooShort,
    ContactRequired,
    UnknownDoctor,
    IneligibleDoctor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub rule: ViolationRule,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("appointment request failed validation ({} violation(s))", .violations.len())]
pub struct SubmissionError {
    pub violations: Vec<FieldViolation>,
}

impl SubmissionError {
    pub fn has(&self, field: &str, rule: ViolationRule) -> bool {
        self.violations
            .iter()
            .any(|violation| violation.field == field && violation.rule == rule)
    }
}

const MIN_PHONE_LENGTH: usize = 10;

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z\p{Cyrillic}\s]+$").expect("name pattern compiles"))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"))
}

fn phone_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+]*[(]?[0-9]{1,3}[)]?[-\s./0-9]*$").expect("phone pattern compiles")
    })
}

fn trimmed(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|inner| !inner.is_empty())
}

impl AppointmentRequest {
    /// Check every field, reporting all violations at once.
    ///
    /// Doctor eligibility against the request's own answers is checked by the
    /// service, which knows the evaluation date.
    pub fn validate(&self, catalogs: &ReferenceCatalogs) -> Result<ValidatedAppointment, SubmissionError> {
        let mut violations = Vec::new();
        let mut flag = |field: &'static str, rule: ViolationRule| {
            violations.push(FieldViolation { field, rule });
        };

        let name = self.name.trim();
        if name.is_empty() {
            flag("name", ViolationRule::Required);
        } else if !name_pattern().is_match(name) {
            flag("name", ViolationRule::InvalidName);
        }

        if self.birth_date.is_none() {
            flag("birthDate", ViolationRule::Required);
        }
        if self.gender.is_none() {
            flag("gender", ViolationRule::Required);
        }
        if self.city_id.is_none() {
            flag("cityId", ViolationRule::Required);
        }

        match &self.doctor_id {
            None => flag("doctorId", ViolationRule::Required),
            Some(id) if catalogs.doctor(id).is_none() => flag("doctorId", ViolationRule::UnknownDoctor),
            Some(_) => {}
        }

        let email = trimmed(&self.email);
        let phone = trimmed(&self.phone);
        match email {
            Some(email) if !email_pattern().is_match(email) => {
                flag("email", ViolationRule::InvalidEmail)
            }
            Some(_) => {}
            None => match phone {
                None => flag("phone", ViolationRule::ContactRequired),
                Some(phone) if !phone_pattern().is_match(phone) => {
                    flag("phone", ViolationRule::InvalidPhone)
                }
                Some(phone) if phone.chars().count() < MIN_PHONE_LENGTH => {
                    flag("phone", ViolationRule::PhoneTooShort)
                }
                Some(_) => {}
            },
        }

        match (self.birth_date, self.gender, &self.city_id, &self.doctor_id) {
            (Some(birth_date), Some(gender), Some(city_id), Some(doctor_id)) if violations.is_empty() => {
                Ok(ValidatedAppointment {
                    name: name.to_string(),
                    birth_date,
                    gender,
                    city_id: city_id.clone(),
                    speciality_id: self.speciality_id.clone(),
                    doctor_id: doctor_id.clone(),
                    email: email.map(str::to_string),
                    phone: phone.map(str::to_string),
                })
            }
            _ => Err(SubmissionError { violations }),
        }
    }
}

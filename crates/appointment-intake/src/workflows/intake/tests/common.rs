use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::workflows::intake::catalog::ReferenceCatalogs;
use crate::workflows::intake::domain::{
    City, CityId, Doctor, DoctorId, Gender, PatientCriteria, Specialty, SpecialtyId,
};
use crate::workflows::intake::eligibility::EligibilityEngine;
use crate::workflows::intake::service::{
    AppointmentIntakeService, SinkError, SubmissionSink, SubmittedAppointment,
};
use crate::workflows::intake::submission::AppointmentRequest;

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date")
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn doctor(id: &str, city: &str, speciality: &str, pediatrician: bool) -> Doctor {
    Doctor {
        id: DoctorId::new(id),
        name: format!("Doctor{id}"),
        surname: "Shevchenko".to_string(),
        city_id: Some(CityId::new(city)),
        speciality_id: Some(SpecialtyId::new(speciality)),
        is_pediatrician: Some(pediatrician),
    }
}

/// Roster record missing every optional field.
pub(super) fn bare_doctor(id: &str) -> Doctor {
    Doctor {
        id: DoctorId::new(id),
        name: String::new(),
        surname: String::new(),
        city_id: None,
        speciality_id: None,
        is_pediatrician: None,
    }
}

pub(super) fn roster() -> Vec<Doctor> {
    vec![
        doctor("1", "1", "2", false),
        doctor("2", "1", "3", false),
        doctor("3", "2", "12", false),
        doctor("4", "2", "4", true),
        doctor("5", "5", "3", false),
        doctor("6", "1", "4", false),
        doctor("7", "2", "9", false),
        doctor("8", "1", "8", true),
        bare_doctor("9"),
        doctor("10", "5", "12", true),
    ]
}

pub(super) fn catalogs() -> ReferenceCatalogs {
    ReferenceCatalogs::new(
        vec![
            City {
                id: CityId::new("1"),
                name: "Kyiv".to_string(),
            },
            City {
                id: CityId::new("2"),
                name: "Lviv".to_string(),
            },
            City {
                id: CityId::new("5"),
                name: "Odesa".to_string(),
            },
        ],
        vec![
            Specialty {
                id: SpecialtyId::new("2"),
                name: "Gynecology".to_string(),
            },
            Specialty {
                id: SpecialtyId::new("3"),
                name: "Urology".to_string(),
            },
            Specialty {
                id: SpecialtyId::new("4"),
                name: "Therapy".to_string(),
            },
            Specialty {
                id: SpecialtyId::new("12"),
                name: "Cardiology".to_string(),
            },
        ],
        roster(),
    )
}

pub(super) fn engine() -> EligibilityEngine {
    EligibilityEngine::default()
}

pub(super) fn criteria() -> PatientCriteria {
    PatientCriteria::default()
}

pub(super) fn ids(doctors: &[Doctor]) -> Vec<&str> {
    doctors.iter().map(|doctor| doctor.id.as_str()).collect()
}

pub(super) fn request() -> AppointmentRequest {
    AppointmentRequest {
        name: "Taras Bondarenko".to_string(),
        birth_date: Some(date(1990, 3, 10)),
        gender: Some(Gender::Male),
        city_id: Some(CityId::new("1")),
        speciality_id: Some(SpecialtyId::new("4")),
        doctor_id: Some(DoctorId::new("6")),
        email: Some("taras@example.org".to_string()),
        phone: None,
    }
}

#[derive(Default, Clone)]
pub(super) struct MemorySink {
    pub(super) delivered: Arc<Mutex<Vec<SubmittedAppointment>>>,
}

impl SubmissionSink for MemorySink {
    fn deliver(&self, submission: &SubmittedAppointment) -> Result<(), SinkError> {
        self.delivered
            .lock()
            .expect("sink mutex poisoned")
            .push(submission.clone());
        Ok(())
    }
}

pub(super) struct UnavailableSink;

impl SubmissionSink for UnavailableSink {
    fn deliver(&self, _submission: &SubmittedAppointment) -> Result<(), SinkError> {
        Err(SinkError::Unavailable("downstream offline".to_string()))
    }
}

pub(super) fn service<S: SubmissionSink + 'static>(sink: S) -> AppointmentIntakeService<S> {
    AppointmentIntakeService::new(Arc::new(catalogs()), engine(), Arc::new(sink))
}

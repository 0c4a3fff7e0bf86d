//! Patient appointment intake: reference catalogs, the eligibility engine that
//! narrows the doctor roster, selection synchronization, the session that owns
//! the in-progress answers, and request submission.

pub mod age;
pub mod catalog;
pub mod domain;
pub mod eligibility;
pub mod router;
pub mod service;
pub mod session;
pub mod submission;
mod sync;

#[cfg(test)]
mod tests;

pub use age::{age_on, age_today};
pub use catalog::{
    CatalogError, CatalogKind, CatalogLocation, CatalogSource, ConfiguredCatalogSource,
    ReferenceCatalogs,
};
pub use domain::{
    parse_date, City, CityId, CriteriaPatch, Doctor, DoctorId, Gender, PatientCriteria,
    Specialty, SpecialtyId,
};
pub use eligibility::{
    AgeBand, EligibilityEngine, EligibilityPolicy, EligibilityRule, FilterOutcome,
    PolicyLoadError, RuleTrace, SpecialtyRestriction,
};
pub use router::intake_router;
pub use service::{
    AppointmentIntakeService, LoggingSubmissionSink, RequestId, SinkError, SubmissionServiceError,
    SubmissionSink, SubmittedAppointment,
};
pub use session::{apply_event, DispatchOutcome, IntakeError, IntakeEvent, IntakeSession};
pub use submission::{
    AppointmentRequest, FieldViolation, SubmissionError, ValidatedAppointment, ViolationRule,
};
pub use sync::derive_patch;

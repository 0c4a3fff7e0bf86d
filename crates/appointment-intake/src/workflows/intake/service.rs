use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::catalog::ReferenceCatalogs;
use super::domain::{Doctor, PatientCriteria};
use super::eligibility::{EligibilityEngine, FilterOutcome};
use super::session::{apply_event, DispatchOutcome, IntakeError, IntakeEvent, IntakeSession};
use super::submission::{
    AppointmentRequest, FieldViolation, SubmissionError, ValidatedAppointment, ViolationRule,
};

/// Identifier handed back for an accepted appointment request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> RequestId {
    let id = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RequestId(format!("req-{id:06}"))
}

/// Accepted request together with the doctor it was filed against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedAppointment {
    pub request_id: RequestId,
    pub appointment: ValidatedAppointment,
    pub doctor: Doctor,
}

/// Outbound hook receiving accepted requests.
pub trait SubmissionSink: Send + Sync {
    fn deliver(&self, submission: &SubmittedAppointment) -> Result<(), SinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("submission sink unavailable: {0}")]
    Unavailable(String),
}

/// Sink that records accepted requests in the service log and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSubmissionSink;

impl SubmissionSink for LoggingSubmissionSink {
    fn deliver(&self, submission: &SubmittedAppointment) -> Result<(), SinkError> {
        info!(
            request_id = %submission.request_id.0,
            doctor = %submission.doctor.id,
            city = %submission.appointment.city_id,
            has_email = submission.appointment.email.is_some(),
            has_phone = submission.appointment.phone.is_some(),
            "appointment request accepted"
        );
        Ok(())
    }
}

/// Facade combining the catalogs, the eligibility engine and the submission sink.
pub struct AppointmentIntakeService<S> {
    catalogs: Arc<ReferenceCatalogs>,
    engine: Arc<EligibilityEngine>,
    sink: Arc<S>,
}

impl<S> AppointmentIntakeService<S>
where
    S: SubmissionSink + 'static,
{
    pub fn new(catalogs: Arc<ReferenceCatalogs>, engine: EligibilityEngine, sink: Arc<S>) -> Self {
        Self {
            catalogs,
            engine: Arc::new(engine),
            sink,
        }
    }

    pub fn catalogs(&self) -> &ReferenceCatalogs {
        &self.catalogs
    }

    pub fn engine(&self) -> &EligibilityEngine {
        &self.engine
    }

    /// Start a stateful session over the shared catalogs.
    pub fn session(&self) -> IntakeSession {
        IntakeSession::new(self.catalogs.clone(), self.engine.clone())
    }

    pub fn eligible_doctors(&self, criteria: &PatientCriteria, today: Option<NaiveDate>) -> FilterOutcome {
        let today = today.unwrap_or_else(|| Local::now().date_naive());
        self.engine.evaluate(&self.catalogs.doctors, criteria, today)
    }

    pub fn apply(
        &self,
        criteria: PatientCriteria,
        event: IntakeEvent,
        today: Option<NaiveDate>,
    ) -> Result<DispatchOutcome, IntakeError> {
        let today = today.unwrap_or_else(|| Local::now().date_naive());
        apply_event(&self.catalogs, &self.engine, criteria, event, today)
    }

    pub fn submit(
        &self,
        request: AppointmentRequest,
    ) -> Result<SubmittedAppointment, SubmissionServiceError> {
        self.submit_on(request, Local::now().date_naive())
    }

    /// Validate, check the doctor against the request's own answers, and deliver.
    pub fn submit_on(
        &self,
        request: AppointmentRequest,
        today: NaiveDate,
    ) -> Result<SubmittedAppointment, SubmissionServiceError> {
        let appointment = request.validate(&self.catalogs)?;

        let eligible = self
            .engine
            .filter_on(&self.catalogs.doctors, &appointment.criteria(), today);
        let doctor = eligible
            .into_iter()
            .find(|doctor| doctor.id == appointment.doctor_id)
            .ok_or_else(|| SubmissionError {
                violations: vec![FieldViolation {
                    field: "doctorId",
                    rule: ViolationRule::IneligibleDoctor,
                }],
            })?;

        let submitted = SubmittedAppointment {
            request_id: next_request_id(),
            appointment,
            doctor,
        };

        self.sink.deliver(&submitted)?;
        Ok(submitted)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionServiceError {
    #[error(transparent)]
    Validation(#[from] SubmissionError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

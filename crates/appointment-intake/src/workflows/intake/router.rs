use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::domain::{optional_date, PatientCriteria};
use super::service::{AppointmentIntakeService, SubmissionServiceError, SubmissionSink};
use super::session::{IntakeError, IntakeEvent};
use super::submission::AppointmentRequest;

#[derive(Debug, Deserialize)]
pub struct EligibleDoctorsRequest {
    #[serde(default)]
    pub criteria: PatientCriteria,
    #[serde(default, deserialize_with = "optional_date")]
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct IntakeEventRequest {
    #[serde(default)]
    pub criteria: PatientCriteria,
    pub event: IntakeEvent,
    #[serde(default, deserialize_with = "optional_date")]
    pub today: Option<NaiveDate>,
}

/// Router builder exposing catalog, eligibility and submission endpoints.
pub fn intake_router<S>(service: Arc<AppointmentIntakeService<S>>) -> Router
where
    S: SubmissionSink + 'static,
{
    Router::new()
        .route("/api/v1/catalog/cities", get(cities_handler::<S>))
        .route("/api/v1/catalog/specialties", get(specialties_handler::<S>))
        .route("/api/v1/catalog/doctors", get(doctors_handler::<S>))
        .route("/api/v1/intake/doctors", post(eligible_doctors_handler::<S>))
        .route("/api/v1/intake/events", post(event_handler::<S>))
        .route("/api/v1/intake/submissions", post(submit_handler::<S>))
        .with_state(service)
}

pub(crate) async fn cities_handler<S>(
    State(service): State<Arc<AppointmentIntakeService<S>>>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    Json(service.catalogs().cities.clone()).into_response()
}

pub(crate) async fn specialties_handler<S>(
    State(service): State<Arc<AppointmentIntakeService<S>>>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    Json(service.catalogs().specialties.clone()).into_response()
}

pub(crate) async fn doctors_handler<S>(
    State(service): State<Arc<AppointmentIntakeService<S>>>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    Json(service.catalogs().doctors.clone()).into_response()
}

pub(crate) async fn eligible_doctors_handler<S>(
    State(service): State<Arc<AppointmentIntakeService<S>>>,
    Json(request): Json<EligibleDoctorsRequest>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    let outcome = service.eligible_doctors(&request.criteria, request.today);
    (StatusCode::OK, Json(outcome)).into_response()
}

pub(crate) async fn event_handler<S>(
    State(service): State<Arc<AppointmentIntakeService<S>>>,
    Json(request): Json<IntakeEventRequest>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    match service.apply(request.criteria, request.event, request.today) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(error @ IntakeError::UnknownDoctor(_)) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<AppointmentIntakeService<S>>>,
    Json(request): Json<AppointmentRequest>,
) -> Response
where
    S: SubmissionSink + 'static,
{
    match service.submit(request) {
        Ok(submitted) => {
            let payload = json!({
                "request_id": submitted.request_id.0,
                "doctor": submitted.doctor,
            });
            (StatusCode::ACCEPTED, Json(payload)).into_response()
        }
        Err(SubmissionServiceError::Validation(error)) => {
            let payload = json!({
                "error": error.to_string(),
                "violations": error.violations,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

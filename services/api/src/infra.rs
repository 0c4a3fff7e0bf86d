use appointment_intake::config::{AppConfig, CatalogConfig};
use appointment_intake::error::AppError;
pub(crate) use appointment_intake::workflows::intake::parse_date;
use appointment_intake::workflows::intake::{
    ConfiguredCatalogSource, EligibilityEngine, Gender, ReferenceCatalogs, SinkError,
    SubmissionSink, SubmittedAppointment,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Keeps accepted requests in memory so the CLI can echo them back.
#[derive(Default, Clone)]
pub(crate) struct InMemorySubmissionSink {
    submissions: Arc<Mutex<Vec<SubmittedAppointment>>>,
}

impl SubmissionSink for InMemorySubmissionSink {
    fn deliver(&self, submission: &SubmittedAppointment) -> Result<(), SinkError> {
        let mut guard = self
            .submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        info!(request_id = %submission.request_id.0, "appointment request stored");
        guard.push(submission.clone());
        Ok(())
    }
}

impl InMemorySubmissionSink {
    pub(crate) fn submissions(&self) -> Vec<SubmittedAppointment> {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Catalogs and engine as configured, with an optional directory override for the catalog files.
pub(crate) async fn load_intake(
    catalog_dir: Option<PathBuf>,
) -> Result<(Arc<ReferenceCatalogs>, EligibilityEngine), AppError> {
    let config = AppConfig::load()?;
    let catalog = match catalog_dir {
        Some(dir) => CatalogConfig::from_dir(dir, config.catalog.timeout_secs),
        None => config.catalog,
    };
    let policy = config.eligibility.policy()?;
    let source = ConfiguredCatalogSource::new(&catalog)?;
    let catalogs = ReferenceCatalogs::load(&source).await;
    Ok((Arc::new(catalogs), EligibilityEngine::new(policy)))
}

pub(crate) fn parse_gender(raw: &str) -> Result<Gender, String> {
    Gender::parse(raw).ok_or_else(|| format!("expected 'male' or 'female', got '{raw}'"))
}

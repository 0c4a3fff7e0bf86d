use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_intake_routes;
use appointment_intake::config::AppConfig;
use appointment_intake::error::AppError;
use appointment_intake::telemetry;
use appointment_intake::workflows::intake::{
    AppointmentIntakeService, ConfiguredCatalogSource, EligibilityEngine, LoggingSubmissionSink,
    ReferenceCatalogs,
};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let policy = config.eligibility.policy()?;
    let source = ConfiguredCatalogSource::new(&config.catalog)?;
    let catalogs = Arc::new(ReferenceCatalogs::load(&source).await);
    let intake_service = Arc::new(AppointmentIntakeService::new(
        catalogs,
        EligibilityEngine::new(policy),
        Arc::new(LoggingSubmissionSink),
    ));

    let app = with_intake_routes(intake_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "appointment intake service ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(drain_on_ctrl_c(readiness_flag))
        .await?;
    Ok(())
}

/// Resolves on Ctrl-C after marking the service unready, so `/ready` fails while requests drain.
async fn drain_on_ctrl_c(readiness: Arc<AtomicBool>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "ctrl-c handler unavailable; serving until the process is killed");
        std::future::pending::<()>().await;
    }
    readiness.store(false, Ordering::Release);
    info!("shutdown requested, draining in-flight requests");
}

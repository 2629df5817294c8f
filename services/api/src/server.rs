use crate::cli::ServeArgs;
use crate::infra::{AppState, RecordingSubmissionGateway};
use crate::routes::with_wizard_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use member_intake::config::AppConfig;
use member_intake::error::AppError;
use member_intake::telemetry;
use member_intake::workflows::wizard::{FileProgressStore, QuestionCatalog, WizardService};
use tracing::info;

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
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(FileProgressStore::new(config.wizard.progress_path.clone()));
    let gateway = Arc::new(RecordingSubmissionGateway::default());
    let wizard_service = Arc::new(WizardService::new(
        QuestionCatalog::standard(),
        store,
        gateway,
    ));

    let app = with_wizard_routes(wizard_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "membership intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::{with_api_routes, ApiServices};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use lien_ledger::clock::{Clock, SystemClock};
use lien_ledger::config::AppConfig;
use lien_ledger::error::AppError;
use lien_ledger::store::SqliteStore;
use lien_ledger::telemetry;
use lien_ledger::upstream::UpstreamClient;
use lien_ledger::workflows::deadlines::DeadlineService;
use lien_ledger::workflows::invoices::InvoiceService;
use lien_ledger::workflows::projects::ProjectService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
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

    let store = Arc::new(SqliteStore::connect(&config.database)?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let deadlines = Arc::new(DeadlineService::new(
        store.clone(),
        store.clone(),
        clock.clone(),
    )?);
    info!(rules = deadlines.rules().len(), "lien rule table loaded");

    let upstream = UpstreamClient::new(config.upstream.clone())?;
    info!(
        services = ?upstream.services().collect::<Vec<_>>(),
        timeout_ms = config.upstream.timeout.as_millis() as u64,
        "upstream forwarding configured"
    );

    let services = ApiServices {
        deadlines,
        invoices: Arc::new(InvoiceService::new(store.clone(), store.clone(), clock)),
        projects: Arc::new(ProjectService::new(store)),
        upstream: Arc::new(upstream),
    };

    let app = with_api_routes(services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, database = %config.database.path, "lien ledger ready");

    axum::serve(listener, app).await?;
    Ok(())
}

use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use lien_ledger::store::SqliteStore;
use lien_ledger::upstream::{upstream_router, UpstreamClient};
use lien_ledger::workflows::deadlines::{deadline_router, DeadlineService};
use lien_ledger::workflows::invoices::{invoice_router, InvoiceService};
use lien_ledger::workflows::projects::{project_router, ProjectService};
use serde_json::json;
use std::sync::Arc;

/// Services backing the HTTP surface.
pub(crate) struct ApiServices {
    pub(crate) deadlines: Arc<DeadlineService<SqliteStore, SqliteStore>>,
    pub(crate) invoices: Arc<InvoiceService<SqliteStore, SqliteStore>>,
    pub(crate) projects: Arc<ProjectService<SqliteStore>>,
    pub(crate) upstream: Arc<UpstreamClient>,
}

pub(crate) fn with_api_routes(services: ApiServices) -> Router {
    Router::new()
        .merge(deadline_router(services.deadlines))
        .merge(invoice_router(services.invoices))
        .merge(project_router(services.projects))
        .merge(upstream_router(services.upstream))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

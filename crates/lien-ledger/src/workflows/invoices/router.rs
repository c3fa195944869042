use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{InvoiceId, InvoicePatch, NewInvoice, NewPayment, PaymentStatus};
use super::repository::InvoiceRepository;
use super::service::InvoiceService;
use crate::error::AppError;
use crate::workflows::projects::ProjectRepository;
use crate::workflows::{run_blocking, JsonBody, QueryParams};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InvoiceListQuery {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    status: Option<PaymentStatus>,
}

/// Router builder exposing invoice CRUD, summaries, and payment recording.
pub fn invoice_router<R, P>(service: Arc<InvoiceService<R, P>>) -> Router
where
    R: InvoiceRepository + 'static,
    P: ProjectRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/invoices",
            get(list_handler::<R, P>).post(create_handler::<R, P>),
        )
        .route("/api/v1/invoices/summary", get(summary_handler::<R, P>))
        .route(
            "/api/v1/invoices/:invoice_id",
            get(get_handler::<R, P>)
                .patch(update_handler::<R, P>)
                .delete(delete_handler::<R, P>),
        )
        .route(
            "/api/v1/invoices/:invoice_id/payments",
            get(payments_handler::<R, P>).post(record_payment_handler::<R, P>),
        )
        .with_state(service)
}

pub(crate) async fn create_handler<R, P>(
    State(service): State<Arc<InvoiceService<R, P>>>,
    JsonBody(invoice): JsonBody<NewInvoice>,
) -> Result<impl IntoResponse, AppError>
where
    R: InvoiceRepository + 'static,
    P: ProjectRepository + 'static,
{
    let view = run_blocking(move || service.create(invoice)).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn list_handler<R, P>(
    State(service): State<Arc<InvoiceService<R, P>>>,
    QueryParams(query): QueryParams<InvoiceListQuery>,
) -> Result<impl IntoResponse, AppError>
where
    R: InvoiceRepository + 'static,
    P: ProjectRepository + 'static,
{
    let invoices = run_blocking(move || service.list(&query.user_id, query.status)).await?;
    Ok(Json(json!({ "invoices": invoices })))
}

pub(crate) async fn summary_handler<R, P>(
    State(service): State<Arc<InvoiceService<R, P>>>,
    QueryParams(query): QueryParams<InvoiceListQuery>,
) -> Result<impl IntoResponse, AppError>
where
    R: InvoiceRepository + 'static,
    P: ProjectRepository + 'static,
{
    let summary = run_blocking(move || service.summary(&query.user_id)).await?;
    Ok(Json(summary))
}

pub(crate) async fn get_handler<R, P>(
    State(service): State<Arc<InvoiceService<R, P>>>,
    Path(invoice_id): Path<i64>,
) -> Result<impl IntoResponse, AppError>
where
    R: InvoiceRepository + 'static,
    P: ProjectRepository + 'static,
{
    let view = run_blocking(move || service.get(InvoiceId(invoice_id))).await?;
    Ok(Json(view))
}

pub(crate) async fn update_handler<R, P>(
    State(service): State<Arc<InvoiceService<R, P>>>,
    Path(invoice_id): Path<i64>,
    JsonBody(patch): JsonBody<InvoicePatch>,
) -> Result<impl IntoResponse, AppError>
where
    R: InvoiceRepository + 'static,
    P: ProjectRepository + 'static,
{
    let view = run_blocking(move || service.update(InvoiceId(invoice_id), patch)).await?;
    Ok(Json(view))
}

pub(crate) async fn delete_handler<R, P>(
    State(service): State<Arc<InvoiceService<R, P>>>,
    Path(invoice_id): Path<i64>,
) -> Result<impl IntoResponse, AppError>
where
    R: InvoiceRepository + 'static,
    P: ProjectRepository + 'static,
{
    run_blocking(move || service.delete(InvoiceId(invoice_id))).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn payments_handler<R, P>(
    State(service): State<Arc<InvoiceService<R, P>>>,
    Path(invoice_id): Path<i64>,
) -> Result<impl IntoResponse, AppError>
where
    R: InvoiceRepository + 'static,
    P: ProjectRepository + 'static,
{
    let payments = run_blocking(move || service.payments(InvoiceId(invoice_id))).await?;
    Ok(Json(json!({ "payments": payments })))
}

pub(crate) async fn record_payment_handler<R, P>(
    State(service): State<Arc<InvoiceService<R, P>>>,
    Path(invoice_id): Path<i64>,
    JsonBody(payment): JsonBody<NewPayment>,
) -> Result<impl IntoResponse, AppError>
where
    R: InvoiceRepository + 'static,
    P: ProjectRepository + 'static,
{
    let payment =
        run_blocking(move || service.record_payment(InvoiceId(invoice_id), payment)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "payment": payment }))))
}

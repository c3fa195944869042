use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    AutoCreateRequest, CalculationRequest, DeadlineId, DeadlinePatch, DeadlineStatus, NewDeadline,
};
use super::repository::DeadlineRepository;
use super::rules::LienRule;
use super::service::DeadlineService;
use crate::error::AppError;
use crate::workflows::projects::ProjectRepository;
use crate::workflows::{run_blocking, JsonBody, OptionalJsonBody, QueryParams};

const DEFAULT_UPCOMING_WINDOW_DAYS: u32 = 30;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeadlineListQuery {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    status: Option<DeadlineStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpcomingQuery {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CompleteRequest {
    #[serde(default)]
    completed_date: Option<NaiveDate>,
}

/// Router builder exposing the lien rule table, calculator, generator, and deadline CRUD.
pub fn deadline_router<R, P>(service: Arc<DeadlineService<R, P>>) -> Router
where
    R: DeadlineRepository + 'static,
    P: ProjectRepository + 'static,
{
    Router::new()
        .route("/api/v1/lien-rules", get(rules_handler::<R, P>))
        .route(
            "/api/v1/deadlines/calculate",
            post(calculate_handler::<R, P>),
        )
        .route(
            "/api/v1/deadlines/auto-create",
            post(auto_create_handler::<R, P>),
        )
        .route("/api/v1/deadlines/upcoming", get(upcoming_handler::<R, P>))
        .route(
            "/api/v1/deadlines",
            get(list_handler::<R, P>).post(create_handler::<R, P>),
        )
        .route(
            "/api/v1/deadlines/:deadline_id",
            get(get_handler::<R, P>)
                .patch(update_handler::<R, P>)
                .delete(delete_handler::<R, P>),
        )
        .route(
            "/api/v1/deadlines/:deadline_id/complete",
            post(complete_handler::<R, P>),
        )
        .with_state(service)
}

pub(crate) async fn rules_handler<R, P>(
    State(service): State<Arc<DeadlineService<R, P>>>,
) -> Json<serde_json::Value>
where
    R: DeadlineRepository + 'static,
    P: ProjectRepository + 'static,
{
    let rules: Vec<&LienRule> = service.rules().rules().collect();
    Json(json!({ "rules": rules }))
}

pub(crate) async fn calculate_handler<R, P>(
    State(service): State<Arc<DeadlineService<R, P>>>,
    JsonBody(request): JsonBody<CalculationRequest>,
) -> Result<impl IntoResponse, AppError>
where
    R: DeadlineRepository + 'static,
    P: ProjectRepository + 'static,
{
    let calculation = service.calculate(request)?;
    Ok(Json(calculation))
}

pub(crate) async fn auto_create_handler<R, P>(
    State(service): State<Arc<DeadlineService<R, P>>>,
    JsonBody(request): JsonBody<AutoCreateRequest>,
) -> Result<impl IntoResponse, AppError>
where
    R: DeadlineRepository + 'static,
    P: ProjectRepository + 'static,
{
    let deadlines = run_blocking(move || service.auto_create(request)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "deadlines": deadlines }))))
}

pub(crate) async fn list_handler<R, P>(
    State(service): State<Arc<DeadlineService<R, P>>>,
    QueryParams(query): QueryParams<DeadlineListQuery>,
) -> Result<impl IntoResponse, AppError>
where
    R: DeadlineRepository + 'static,
    P: ProjectRepository + 'static,
{
    let deadlines = run_blocking(move || service.list(&query.user_id, query.status)).await?;
    Ok(Json(json!({ "deadlines": deadlines })))
}

pub(crate) async fn upcoming_handler<R, P>(
    State(service): State<Arc<DeadlineService<R, P>>>,
    QueryParams(query): QueryParams<UpcomingQuery>,
) -> Result<impl IntoResponse, AppError>
where
    R: DeadlineRepository + 'static,
    P: ProjectRepository + 'static,
{
    let days = query.days.unwrap_or(DEFAULT_UPCOMING_WINDOW_DAYS);
    let deadlines = run_blocking(move || service.upcoming(&query.user_id, days)).await?;
    Ok(Json(json!({ "deadlines": deadlines })))
}

pub(crate) async fn create_handler<R, P>(
    State(service): State<Arc<DeadlineService<R, P>>>,
    JsonBody(deadline): JsonBody<NewDeadline>,
) -> Result<impl IntoResponse, AppError>
where
    R: DeadlineRepository + 'static,
    P: ProjectRepository + 'static,
{
    let view = run_blocking(move || service.create(deadline)).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub(crate) async fn get_handler<R, P>(
    State(service): State<Arc<DeadlineService<R, P>>>,
    Path(deadline_id): Path<i64>,
) -> Result<impl IntoResponse, AppError>
where
    R: DeadlineRepository + 'static,
    P: ProjectRepository + 'static,
{
    let view = run_blocking(move || service.get(DeadlineId(deadline_id))).await?;
    Ok(Json(view))
}

pub(crate) async fn update_handler<R, P>(
    State(service): State<Arc<DeadlineService<R, P>>>,
    Path(deadline_id): Path<i64>,
    JsonBody(patch): JsonBody<DeadlinePatch>,
) -> Result<impl IntoResponse, AppError>
where
    R: DeadlineRepository + 'static,
    P: ProjectRepository + 'static,
{
    let view = run_blocking(move || service.update(DeadlineId(deadline_id), patch)).await?;
    Ok(Json(view))
}

pub(crate) async fn complete_handler<R, P>(
    State(service): State<Arc<DeadlineService<R, P>>>,
    Path(deadline_id): Path<i64>,
    OptionalJsonBody(request): OptionalJsonBody<CompleteRequest>,
) -> Result<impl IntoResponse, AppError>
where
    R: DeadlineRepository + 'static,
    P: ProjectRepository + 'static,
{
    let request = request.unwrap_or_default();
    let view = run_blocking(move || {
        service.complete(DeadlineId(deadline_id), request.completed_date)
    })
    .await?;
    Ok(Json(view))
}

pub(crate) async fn delete_handler<R, P>(
    State(service): State<Arc<DeadlineService<R, P>>>,
    Path(deadline_id): Path<i64>,
) -> Result<impl IntoResponse, AppError>
where
    R: DeadlineRepository + 'static,
    P: ProjectRepository + 'static,
{
    run_blocking(move || service.delete(DeadlineId(deadline_id))).await?;
    Ok(StatusCode::NO_CONTENT)
}

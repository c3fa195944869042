use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{NewProject, ProjectId};
use super::repository::ProjectRepository;
use super::service::ProjectService;
use crate::error::AppError;
use crate::workflows::{run_blocking, JsonBody, QueryParams};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectListQuery {
    #[serde(default)]
    user_id: String,
}

/// Router builder exposing project CRUD endpoints.
pub fn project_router<R>(service: Arc<ProjectService<R>>) -> Router
where
    R: ProjectRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/projects",
            post(create_handler::<R>).get(list_handler::<R>),
        )
        .route(
            "/api/v1/projects/:project_id",
            get(get_handler::<R>).delete(delete_handler::<R>),
        )
        .with_state(service)
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<ProjectService<R>>>,
    JsonBody(project): JsonBody<NewProject>,
) -> Result<impl IntoResponse, AppError>
where
    R: ProjectRepository + 'static,
{
    let project = run_blocking(move || service.create(project)).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<ProjectService<R>>>,
    QueryParams(query): QueryParams<ProjectListQuery>,
) -> Result<impl IntoResponse, AppError>
where
    R: ProjectRepository + 'static,
{
    let projects = run_blocking(move || service.list(&query.user_id)).await?;
    Ok(Json(json!({ "projects": projects })))
}

pub(crate) async fn get_handler<R>(
    State(service): State<Arc<ProjectService<R>>>,
    Path(project_id): Path<i64>,
) -> Result<impl IntoResponse, AppError>
where
    R: ProjectRepository + 'static,
{
    let project = run_blocking(move || service.get(ProjectId(project_id))).await?;
    Ok(Json(project))
}

pub(crate) async fn delete_handler<R>(
    State(service): State<Arc<ProjectService<R>>>,
    Path(project_id): Path<i64>,
) -> Result<impl IntoResponse, AppError>
where
    R: ProjectRepository + 'static,
{
    run_blocking(move || service.delete(ProjectId(project_id))).await?;
    Ok(StatusCode::NO_CONTENT)
}

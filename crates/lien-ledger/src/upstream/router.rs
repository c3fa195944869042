use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::{header, HeaderMap, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;

use super::{ForwardRequest, UpstreamClient};
use crate::error::AppError;

pub fn upstream_router(client: Arc<UpstreamClient>) -> Router {
    Router::new()
        .route("/api/v1/upstream/:service/*path", any(forward))
        .with_state(client)
}

pub(crate) async fn forward(
    State(client): State<Arc<UpstreamClient>>,
    Path((service, path)): Path<(String, String)>,
    RawQuery(query): RawQuery,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let request = ForwardRequest {
        method,
        path,
        query,
        headers,
        body,
    };
    let forwarded = client.forward(&service, request).await?;

    let mut response = (forwarded.status, forwarded.body).into_response();
    if let Some(value) = forwarded
        .content_type
        .and_then(|value| HeaderValue::from_str(&value).ok())
    {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use reqwest::Url;
    use tower::ServiceExt;

    #[tokio::test]
    async fn unconfigured_service_is_not_found() {
        let client = UpstreamClient::new(UpstreamConfig::default()).expect("client");
        let app = upstream_router(Arc::new(client));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/upstream/llm/v1/complete")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn traversal_out_of_the_service_base_is_a_bad_request() {
        let mut config = UpstreamConfig::default();
        config.services.insert(
            "mailer".to_string(),
            Url::parse("http://gw.internal/mailer/v2/").expect("url"),
        );
        let app = upstream_router(Arc::new(UpstreamClient::new(config).expect("client")));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/upstream/mailer/%2e%2e/%2e%2e/billing/admin")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let body: serde_json::Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(body["error"], "invalid upstream path '../../billing/admin'");
    }
}

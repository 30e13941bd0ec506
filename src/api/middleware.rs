/// Request middleware and shared extractors
use crate::{context::AppContext, error::RelayError, metrics, remote::VERSION_HEADER};
use axum::{
    async_trait,
    extract::{FromRequestParts, MatchedPath, Request, State},
    http::{request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// Fill in the `version` header when a caller omits it
///
/// Handlers forward this header to the remote applications unchanged.
pub async fn default_version(
    State(ctx): State<AppContext>,
    mut req: Request,
    next: Next,
) -> Response {
    if !req.headers().contains_key(VERSION_HEADER) {
        match HeaderValue::from_str(&ctx.config.service.api_version) {
            Ok(value) => {
                req.headers_mut().insert(VERSION_HEADER, value);
            }
            Err(e) => {
                tracing::warn!("Configured API version is not a valid header value: {}", e);
            }
        }
    }

    next.run(req).await
}

/// Record request counts and latencies by route
pub async fn track_http_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    metrics::record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}

/// API version requested by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiVersion(pub String);

impl ApiVersion {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl FromRequestParts<AppContext> for ApiVersion {
    type Rejection = RelayError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        match parts.headers.get(VERSION_HEADER) {
            Some(value) => value
                .to_str()
                .map(|v| ApiVersion(v.to_string()))
                .map_err(|_| RelayError::Validation("Invalid version header".to_string())),
            None => Ok(ApiVersion(state.config.service.api_version.clone())),
        }
    }
}

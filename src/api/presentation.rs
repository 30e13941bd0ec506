/// Presentation request and presentation verification endpoints
use crate::{
    api::middleware::ApiVersion,
    context::AppContext,
    db::models::PresentationRequest,
    error::RelayResult,
    services::{
        CreatePresentationRequest, EncryptedPresentationV2, EncryptedPresentationV3,
        VerificationResponse,
    },
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route(
            "/presentationRequest",
            get(find_presentation_requests).post(create_presentation_request),
        )
        .route("/presentationRequest/:uuid", get(get_presentation_request))
        .route("/presentation", post(verify_presentation))
        .route("/presentationV2", post(verify_presentation_v2))
        .route("/presentationV3", post(verify_presentation_v3))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestQuery {
    verifier_uuid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifierParam {
    verifier: Option<String>,
}

async fn create_presentation_request(
    State(ctx): State<AppContext>,
    version: ApiVersion,
    Json(req): Json<CreatePresentationRequest>,
) -> RelayResult<(StatusCode, Json<PresentationRequest>)> {
    req.validate()?;
    let request = ctx.request_service.create(req, version.as_str()).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

async fn find_presentation_requests(
    State(ctx): State<AppContext>,
    Query(query): Query<RequestQuery>,
) -> RelayResult<Json<Vec<PresentationRequest>>> {
    let requests = ctx
        .presentation_requests
        .find(query.verifier_uuid.as_deref())
        .await?;
    Ok(Json(requests))
}

async fn get_presentation_request(
    State(ctx): State<AppContext>,
    Path(uuid): Path<String>,
) -> RelayResult<Json<PresentationRequest>> {
    Ok(Json(ctx.presentation_requests.get(&uuid).await?))
}

/// Plaintext presentation; the verifier comes from `?verifier=<uuid>`
async fn verify_presentation(
    State(ctx): State<AppContext>,
    Query(param): Query<VerifierParam>,
    version: ApiVersion,
    Json(presentation): Json<Value>,
) -> RelayResult<Json<VerificationResponse>> {
    let response = ctx
        .presentations
        .verify_v1(param.verifier.as_deref(), presentation, version.as_str())
        .await?;
    Ok(Json(response))
}

async fn verify_presentation_v2(
    State(ctx): State<AppContext>,
    version: ApiVersion,
    Json(body): Json<EncryptedPresentationV2>,
) -> RelayResult<Json<VerificationResponse>> {
    Ok(Json(ctx.presentations.verify_v2(body, version.as_str()).await?))
}

async fn verify_presentation_v3(
    State(ctx): State<AppContext>,
    version: ApiVersion,
    Json(body): Json<EncryptedPresentationV3>,
) -> RelayResult<Json<VerificationResponse>> {
    Ok(Json(ctx.presentations.verify_v3(body, version.as_str()).await?))
}

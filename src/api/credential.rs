/// Issued credential, shared credential and credential status endpoints
use crate::{
    api::middleware::ApiVersion,
    context::AppContext,
    db::models::{IssuedCredential, SharedCredential},
    error::RelayResult,
    services::{CredentialStatusUpdate, IssueCredential},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route(
            "/issuedCredential",
            get(find_issued_credentials).post(issue_credential),
        )
        .route("/issuedCredential/:uuid", get(get_issued_credential))
        .route("/sharedCredential", get(find_shared_credentials))
        .route("/sharedCredential/:uuid", get(get_shared_credential))
        .route("/credentialStatus/:credential_id", patch(update_credential_status))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssuedQuery {
    issuer_uuid: Option<String>,
    user_uuid: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SharedQuery {
    verifier_uuid: Option<String>,
    user_uuid: Option<String>,
}

/// Issue a credential through the issuer application
async fn issue_credential(
    State(ctx): State<AppContext>,
    version: ApiVersion,
    Json(req): Json<IssueCredential>,
) -> RelayResult<(StatusCode, Json<IssuedCredential>)> {
    req.validate()?;
    let issued = ctx.issuance.issue(req, version.as_str()).await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

async fn find_issued_credentials(
    State(ctx): State<AppContext>,
    Query(query): Query<IssuedQuery>,
) -> RelayResult<Json<Vec<IssuedCredential>>> {
    let records = ctx
        .credentials
        .find_issued(query.issuer_uuid.as_deref(), query.user_uuid.as_deref())
        .await?;
    Ok(Json(records))
}

async fn get_issued_credential(
    State(ctx): State<AppContext>,
    Path(uuid): Path<String>,
) -> RelayResult<Json<IssuedCredential>> {
    Ok(Json(ctx.credentials.get_issued(&uuid).await?))
}

async fn find_shared_credentials(
    State(ctx): State<AppContext>,
    Query(query): Query<SharedQuery>,
) -> RelayResult<Json<Vec<SharedCredential>>> {
    let records = ctx
        .credentials
        .find_shared(query.verifier_uuid.as_deref(), query.user_uuid.as_deref())
        .await?;
    Ok(Json(records))
}

async fn get_shared_credential(
    State(ctx): State<AppContext>,
    Path(uuid): Path<String>,
) -> RelayResult<Json<SharedCredential>> {
    Ok(Json(ctx.credentials.get_shared(&uuid).await?))
}

/// Mark a credential valid or revoked
async fn update_credential_status(
    State(ctx): State<AppContext>,
    Path(credential_id): Path<String>,
    version: ApiVersion,
    Json(req): Json<CredentialStatusUpdate>,
) -> RelayResult<Json<Value>> {
    req.validate()?;
    let reply = ctx
        .issuance
        .update_status(&credential_id, req, version.as_str())
        .await?;
    Ok(Json(reply))
}

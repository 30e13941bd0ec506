/// Verifier endpoints
use crate::{
    context::AppContext,
    db::models::Verifier,
    error::RelayResult,
    services::RegisterVerifier,
    store::VerifierPatch,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/verifier", get(find_verifiers).post(register_verifier))
        .route("/verifier/:uuid", get(get_verifier).patch(patch_verifier))
}

#[derive(Debug, Deserialize)]
struct VerifierQuery {
    did: Option<String>,
}

async fn register_verifier(
    State(ctx): State<AppContext>,
    Json(req): Json<RegisterVerifier>,
) -> RelayResult<(StatusCode, Json<Verifier>)> {
    req.validate()?;
    let verifier = ctx.registration.register_verifier(req).await?;
    Ok((StatusCode::CREATED, Json(verifier)))
}

async fn find_verifiers(
    State(ctx): State<AppContext>,
    Query(query): Query<VerifierQuery>,
) -> RelayResult<Json<Vec<Verifier>>> {
    Ok(Json(ctx.verifiers.find(query.did.as_deref()).await?))
}

async fn get_verifier(
    State(ctx): State<AppContext>,
    Path(uuid): Path<String>,
) -> RelayResult<Json<Verifier>> {
    Ok(Json(ctx.verifiers.get(&uuid).await?))
}

async fn patch_verifier(
    State(ctx): State<AppContext>,
    Path(uuid): Path<String>,
    Json(patch): Json<VerifierPatch>,
) -> RelayResult<Json<Verifier>> {
    patch.validate()?;
    Ok(Json(ctx.verifiers.patch(&uuid, patch).await?))
}

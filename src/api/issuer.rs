/// Issuer endpoints
use crate::{
    context::AppContext,
    db::models::Issuer,
    error::RelayResult,
    services::RegisterIssuer,
    store::IssuerPatch,
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
        .route("/issuer", get(find_issuers).post(register_issuer))
        .route("/issuer/:uuid", get(get_issuer).patch(patch_issuer))
}

#[derive(Debug, Deserialize)]
struct IssuerQuery {
    did: Option<String>,
}

/// Register with the issuer application and store the result
async fn register_issuer(
    State(ctx): State<AppContext>,
    Json(req): Json<RegisterIssuer>,
) -> RelayResult<(StatusCode, Json<Issuer>)> {
    req.validate()?;
    let issuer = ctx.registration.register_issuer(req).await?;
    Ok((StatusCode::CREATED, Json(issuer)))
}

async fn find_issuers(
    State(ctx): State<AppContext>,
    Query(query): Query<IssuerQuery>,
) -> RelayResult<Json<Vec<Issuer>>> {
    Ok(Json(ctx.issuers.find(query.did.as_deref()).await?))
}

async fn get_issuer(
    State(ctx): State<AppContext>,
    Path(uuid): Path<String>,
) -> RelayResult<Json<Issuer>> {
    Ok(Json(ctx.issuers.get(&uuid).await?))
}

async fn patch_issuer(
    State(ctx): State<AppContext>,
    Path(uuid): Path<String>,
    Json(patch): Json<IssuerPatch>,
) -> RelayResult<Json<Issuer>> {
    patch.validate()?;
    Ok(Json(ctx.issuers.patch(&uuid, patch).await?))
}

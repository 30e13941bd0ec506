/// Company endpoints
use crate::{
    context::AppContext,
    db::models::Company,
    error::RelayResult,
    store::{CompanyPatch, NewCompany},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use validator::Validate;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/company", get(find_companies).post(create_company))
        .route("/company/:uuid", get(get_company).patch(patch_company))
}

async fn create_company(
    State(ctx): State<AppContext>,
    Json(req): Json<NewCompany>,
) -> RelayResult<(StatusCode, Json<Company>)> {
    req.validate()?;
    let company = ctx.companies.create(req).await?;
    tracing::info!(company = %company.uuid, "Created company");
    Ok((StatusCode::CREATED, Json(company)))
}

async fn find_companies(State(ctx): State<AppContext>) -> RelayResult<Json<Vec<Company>>> {
    Ok(Json(ctx.companies.find().await?))
}

async fn get_company(
    State(ctx): State<AppContext>,
    Path(uuid): Path<String>,
) -> RelayResult<Json<Company>> {
    Ok(Json(ctx.companies.get(&uuid).await?))
}

async fn patch_company(
    State(ctx): State<AppContext>,
    Path(uuid): Path<String>,
    Json(patch): Json<CompanyPatch>,
) -> RelayResult<Json<Company>> {
    patch.validate()?;
    Ok(Json(ctx.companies.patch(&uuid, patch).await?))
}

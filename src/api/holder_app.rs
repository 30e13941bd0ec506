/// Holder app endpoints
use crate::{
    context::AppContext,
    db::models::HolderApp,
    error::RelayResult,
    store::NewHolderApp,
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
        .route("/holderApp", get(find_holder_apps).post(create_holder_app))
        .route("/holderApp/:uuid", get(get_holder_app))
}

async fn create_holder_app(
    State(ctx): State<AppContext>,
    Json(req): Json<NewHolderApp>,
) -> RelayResult<(StatusCode, Json<HolderApp>)> {
    req.validate()?;
    Ok((StatusCode::CREATED, Json(ctx.holder_apps.create(req).await?)))
}

async fn find_holder_apps(State(ctx): State<AppContext>) -> RelayResult<Json<Vec<HolderApp>>> {
    Ok(Json(ctx.holder_apps.find().await?))
}

async fn get_holder_app(
    State(ctx): State<AppContext>,
    Path(uuid): Path<String>,
) -> RelayResult<Json<HolderApp>> {
    Ok(Json(ctx.holder_apps.get(&uuid).await?))
}

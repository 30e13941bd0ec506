/// User endpoints
use crate::{
    context::AppContext,
    db::models::User,
    error::RelayResult,
    store::{NewUser, UserPatch},
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
        .route("/user", get(find_users).post(create_user))
        .route("/user/:uuid", get(get_user).patch(patch_user))
}

#[derive(Debug, Deserialize)]
struct UserQuery {
    did: Option<String>,
}

async fn create_user(
    State(ctx): State<AppContext>,
    Json(req): Json<NewUser>,
) -> RelayResult<(StatusCode, Json<User>)> {
    req.validate()?;
    let user = ctx.users.create(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn find_users(
    State(ctx): State<AppContext>,
    Query(query): Query<UserQuery>,
) -> RelayResult<Json<Vec<User>>> {
    Ok(Json(ctx.users.find(query.did.as_deref()).await?))
}

async fn get_user(
    State(ctx): State<AppContext>,
    Path(uuid): Path<String>,
) -> RelayResult<Json<User>> {
    Ok(Json(ctx.users.get(&uuid).await?))
}

async fn patch_user(
    State(ctx): State<AppContext>,
    Path(uuid): Path<String>,
    Json(patch): Json<UserPatch>,
) -> RelayResult<Json<User>> {
    patch.validate()?;
    Ok(Json(ctx.users.patch(&uuid, patch).await?))
}

/// SMS and email deeplink endpoints
use crate::{
    api::middleware::ApiVersion,
    context::AppContext,
    error::RelayResult,
    services::{EmailRequest, SmsRequest},
};
use axum::{extract::State, routing::post, Json, Router};
use serde_json::Value;
use validator::Validate;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/sms", post(send_sms))
        .route("/email", post(send_email))
}

async fn send_sms(
    State(ctx): State<AppContext>,
    version: ApiVersion,
    Json(req): Json<SmsRequest>,
) -> RelayResult<Json<Value>> {
    req.validate()?;
    Ok(Json(ctx.messaging.send_sms(req, version.as_str()).await?))
}

async fn send_email(
    State(ctx): State<AppContext>,
    version: ApiVersion,
    Json(req): Json<EmailRequest>,
) -> RelayResult<Json<Value>> {
    req.validate()?;
    Ok(Json(ctx.messaging.send_email(req, version.as_str()).await?))
}

/// API routes and handlers
pub mod company;
pub mod credential;
pub mod health;
pub mod holder_app;
pub mod issuer;
pub mod messaging;
pub mod middleware;
pub mod presentation;
pub mod realtime;
pub mod user;
pub mod verifier;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(health::routes())
        .merge(company::routes())
        .merge(issuer::routes())
        .merge(verifier::routes())
        .merge(user::routes())
        .merge(holder_app::routes())
        .merge(credential::routes())
        .merge(presentation::routes())
        .merge(messaging::routes())
        .merge(realtime::routes())
}

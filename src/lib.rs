/// Credential relay
///
/// Issues, verifies and shares verifiable credentials on behalf of users by
/// relaying requests to remote issuer and verifier applications, and pushes
/// verification results to connected clients over WebSocket channels.

pub mod api;
pub mod channels;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod metrics;
pub mod remote;
pub mod server;
pub mod services;
pub mod store;

pub use context::AppContext;
pub use server::build_router;

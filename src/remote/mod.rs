/// Clients for the remote issuer and verifier applications
///
/// Every call carries a bearer `Authorization` header (when the caller owns
/// a token) and the API `version` header. The remote side may reissue the
/// caller's token through the `x-auth-token` response header; it is handed
/// back in [`RemoteResponse::auth_token`] for the caller to persist.

pub mod issuer;
pub mod models;
pub mod verifier;

pub use issuer::IssuerClient;
pub use verifier::VerifierClient;

use crate::{
    config::RemoteConfig,
    error::{RelayError, RelayResult},
    metrics,
};
use serde::{de::DeserializeOwned, Serialize};
use std::time::{Duration, Instant};

/// Response header carrying a reissued auth token
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Request header selecting the remote API version
pub const VERSION_HEADER: &str = "version";

/// Normalize a stored token to `Bearer <token>`
///
/// Older rows were stored without the scheme prefix.
pub fn bearer(token: &str) -> String {
    if token.starts_with("Bearer ") {
        token.to_string()
    } else {
        format!("Bearer {}", token)
    }
}

/// Parsed response body plus the (possibly reissued) auth token
#[derive(Debug, Clone)]
pub struct RemoteResponse<T> {
    pub body: T,
    pub auth_token: Option<String>,
}

impl<T> RemoteResponse<T> {
    /// The reissued token, if it differs from the one we sent
    pub fn rotated_token(&self, stored: &str) -> Option<&str> {
        self.auth_token
            .as_deref()
            .filter(|token| !token.is_empty() && *token != stored)
    }
}

/// Shared HTTP plumbing for one remote application
#[derive(Clone)]
pub(crate) struct RemoteClient {
    http: reqwest::Client,
    base_url: String,
    service: &'static str,
}

impl RemoteClient {
    pub(crate) fn new(
        service: &'static str,
        base_url: &str,
        config: &RemoteConfig,
    ) -> RelayResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RelayError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service,
        })
    }

    /// POST a JSON body and decode the JSON response
    pub(crate) async fn post<B, T>(
        &self,
        path: &str,
        body: &B,
        auth_token: Option<&str>,
        version: Option<&str>,
    ) -> RelayResult<RemoteResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let start = Instant::now();

        let mut request = self.http.post(&url).json(body);
        if let Some(token) = auth_token {
            request = request.header(reqwest::header::AUTHORIZATION, bearer(token));
        }
        if let Some(version) = version {
            request = request.header(VERSION_HEADER, version);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_remote_call(self.service, path, "transport_error", start.elapsed().as_secs_f64());
                tracing::error!(service = self.service, %url, "Request to remote {} failed: {}", self.service, e);
                return Err(RelayError::Transport(e));
            }
        };

        let status = response.status();
        let auth_token = response
            .headers()
            .get(AUTH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            metrics::record_remote_call(self.service, path, "error_status", start.elapsed().as_secs_f64());
            tracing::error!(
                service = self.service,
                %url,
                status = status.as_u16(),
                "Remote {} returned an error: {}",
                self.service,
                message
            );
            return Err(RelayError::Remote {
                service: self.service,
                status: status.as_u16(),
                message,
            });
        }

        let body = response.json::<T>().await.map_err(|e| {
            metrics::record_remote_call(self.service, path, "invalid_body", start.elapsed().as_secs_f64());
            RelayError::Remote {
                service: self.service,
                status: status.as_u16(),
                message: format!("Unreadable response body: {}", e),
            }
        })?;

        metrics::record_remote_call(self.service, path, "success", start.elapsed().as_secs_f64());
        tracing::debug!(service = self.service, %url, "Remote call succeeded");

        Ok(RemoteResponse { body, auth_token })
    }
}

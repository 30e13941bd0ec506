/// Client for the remote issuer application
use crate::{
    config::RemoteConfig,
    error::RelayResult,
    remote::{
        models::{
            CredentialStatusRequest, IssueCredentialRequest, Registration, RegistrationRequest,
        },
        RemoteClient, RemoteResponse,
    },
};
use serde_json::Value;

#[derive(Clone)]
pub struct IssuerClient {
    inner: RemoteClient,
}

impl IssuerClient {
    pub fn new(config: &RemoteConfig) -> RelayResult<Self> {
        Ok(Self {
            inner: RemoteClient::new("issuer", &config.issuer_url, config)?,
        })
    }

    /// Register a new issuer under the customer's account
    pub async fn register(
        &self,
        request: &RegistrationRequest,
    ) -> RelayResult<RemoteResponse<Registration>> {
        self.inner.post("/api/register", request, None, None).await
    }

    /// Ask the issuer application to sign a credential
    pub async fn issue_credential(
        &self,
        auth_token: &str,
        version: &str,
        request: &IssueCredentialRequest,
    ) -> RelayResult<RemoteResponse<Value>> {
        self.inner
            .post("/api/issueCredentials", request, Some(auth_token), Some(version))
            .await
    }

    /// Mark a previously issued credential valid or revoked
    pub async fn update_credential_status(
        &self,
        auth_token: &str,
        version: &str,
        request: &CredentialStatusRequest,
    ) -> RelayResult<RemoteResponse<Value>> {
        self.inner
            .post("/api/updateCredentialStatus", request, Some(auth_token), Some(version))
            .await
    }
}

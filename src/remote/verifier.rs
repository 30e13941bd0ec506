/// Client for the remote verifier application
use crate::{
    config::RemoteConfig,
    error::RelayResult,
    remote::{
        models::{
            DeeplinkMessage, EncryptedVerificationRequest, Registration, RegistrationRequest,
            SendRequestBody, SendRequestResponse, VerificationResult,
        },
        RemoteClient, RemoteResponse,
    },
};
use serde_json::Value;

#[derive(Clone)]
pub struct VerifierClient {
    inner: RemoteClient,
}

impl VerifierClient {
    pub fn new(config: &RemoteConfig) -> RelayResult<Self> {
        Ok(Self {
            inner: RemoteClient::new("verifier", &config.verifier_url, config)?,
        })
    }

    /// Register a new verifier under the customer's account
    pub async fn register(
        &self,
        request: &RegistrationRequest,
    ) -> RelayResult<RemoteResponse<Registration>> {
        self.inner.post("/api/register", request, None, None).await
    }

    /// Create a presentation request addressed to a holder app
    pub async fn send_request(
        &self,
        auth_token: &str,
        version: &str,
        body: &SendRequestBody,
    ) -> RelayResult<RemoteResponse<SendRequestResponse>> {
        self.inner
            .post("/api/sendRequest", body, Some(auth_token), Some(version))
            .await
    }

    /// Verify a plaintext presentation
    pub async fn verify_presentation(
        &self,
        auth_token: &str,
        version: &str,
        presentation: &Value,
    ) -> RelayResult<RemoteResponse<VerificationResult>> {
        self.inner
            .post("/api/verifyPresentation", presentation, Some(auth_token), Some(version))
            .await
    }

    /// Verify a plaintext NoPresentation
    pub async fn verify_no_presentation(
        &self,
        auth_token: &str,
        version: &str,
        presentation: &Value,
    ) -> RelayResult<RemoteResponse<VerificationResult>> {
        self.inner
            .post("/api/verifyNoPresentation", presentation, Some(auth_token), Some(version))
            .await
    }

    /// Decrypt and verify an encrypted presentation (v2 endpoint)
    pub async fn verify_encrypted_presentation(
        &self,
        auth_token: &str,
        version: &str,
        request: &EncryptedVerificationRequest,
    ) -> RelayResult<RemoteResponse<VerificationResult>> {
        self.inner
            .post("/api/verifyEncryptedPresentation", request, Some(auth_token), Some(version))
            .await
    }

    /// Decrypt and verify an encrypted presentation (v3 endpoint)
    pub async fn verify_presentation_v3(
        &self,
        auth_token: &str,
        version: &str,
        request: &EncryptedVerificationRequest,
    ) -> RelayResult<RemoteResponse<VerificationResult>> {
        self.inner
            .post("/api/verifyPresentation", request, Some(auth_token), Some(version))
            .await
    }

    pub async fn send_sms(
        &self,
        auth_token: &str,
        version: &str,
        message: &DeeplinkMessage,
    ) -> RelayResult<RemoteResponse<Value>> {
        self.inner
            .post("/api/sendSms", message, Some(auth_token), Some(version))
            .await
    }

    pub async fn send_email(
        &self,
        auth_token: &str,
        version: &str,
        message: &DeeplinkMessage,
    ) -> RelayResult<RemoteResponse<Value>> {
        self.inner
            .post("/api/sendEmail", message, Some(auth_token), Some(version))
            .await
    }
}

/// Deeplink delivery by SMS and email through the verifier application
use crate::{
    error::RelayResult,
    remote::{models::DeeplinkMessage, VerifierClient},
    services::rotate_verifier_token,
    store::VerifierStore,
};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

/// Body of `POST /sms`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SmsRequest {
    #[validate(length(min = 1, message = "to is required"))]
    pub to: String,
    #[validate(length(min = 1, message = "deeplink is required"))]
    pub deeplink: String,
}

/// Body of `POST /email`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    #[validate(email(message = "to must be an email address"))]
    pub to: String,
    #[validate(length(min = 1, message = "deeplink is required"))]
    pub deeplink: String,
}

#[derive(Clone)]
pub struct MessagingService {
    verifiers: VerifierStore,
    client: VerifierClient,
}

impl MessagingService {
    pub fn new(verifiers: VerifierStore, client: VerifierClient) -> Self {
        Self { verifiers, client }
    }

    pub async fn send_sms(&self, request: SmsRequest, version: &str) -> RelayResult<Value> {
        let verifier = self.verifiers.first().await?;
        let message = DeeplinkMessage {
            to: request.to,
            deeplink: request.deeplink,
        };

        let response = self
            .client
            .send_sms(&verifier.auth_token, version, &message)
            .await?;
        rotate_verifier_token(&self.verifiers, &verifier, &response).await?;

        tracing::info!(verifier = %verifier.uuid, "Sent deeplink by SMS");
        Ok(response.body)
    }

    pub async fn send_email(&self, request: EmailRequest, version: &str) -> RelayResult<Value> {
        let verifier = self.verifiers.first().await?;
        let message = DeeplinkMessage {
            to: request.to,
            deeplink: request.deeplink,
        };

        let response = self
            .client
            .send_email(&verifier.auth_token, version, &message)
            .await?;
        rotate_verifier_token(&self.verifiers, &verifier, &response).await?;

        tracing::info!(verifier = %verifier.uuid, "Sent deeplink by email");
        Ok(response.body)
    }
}

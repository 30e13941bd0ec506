/// Creating presentation requests through the verifier application
use crate::{
    db::models::PresentationRequest,
    error::{RelayError, RelayResult},
    remote::{models::SendRequestBody, VerifierClient},
    services::rotate_verifier_token,
    store::{HolderAppStore, NewPresentationRequest, PresentationRequestStore, VerifierStore},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

/// Body of `POST /presentationRequest`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePresentationRequest {
    #[validate(length(min = 1, message = "verifierUuid is required"))]
    pub verifier_uuid: String,
    /// Requested credentials, passed through to the verifier untouched
    pub credential_requests: Value,
    pub holder_app_uuid: Option<String>,
    /// Free-form data kept with the request; `userUuid` routes realtime events
    #[serde(default)]
    pub metadata: Option<Value>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct PresentationRequestService {
    verifiers: VerifierStore,
    holder_apps: HolderAppStore,
    requests: PresentationRequestStore,
    client: VerifierClient,
}

impl PresentationRequestService {
    pub fn new(
        verifiers: VerifierStore,
        holder_apps: HolderAppStore,
        requests: PresentationRequestStore,
        client: VerifierClient,
    ) -> Self {
        Self {
            verifiers,
            holder_apps,
            requests,
            client,
        }
    }

    /// Ask the verifier to create a request, then keep a copy
    pub async fn create(
        &self,
        request: CreatePresentationRequest,
        version: &str,
    ) -> RelayResult<PresentationRequest> {
        let verifier = self.verifiers.get(&request.verifier_uuid).await?;
        if let Some(uuid) = &request.holder_app_uuid {
            self.holder_apps.get(uuid).await?;
        }
        let metadata = request.metadata.unwrap_or_else(|| json!({}));

        let response = self
            .client
            .send_request(
                &verifier.auth_token,
                version,
                &SendRequestBody {
                    verifier: verifier.did.clone(),
                    credential_requests: request.credential_requests,
                    signing_private_key: verifier.private_key.clone(),
                    holder_app_uuid: request.holder_app_uuid.clone(),
                    metadata: metadata.clone(),
                    expires_at: request.expires_at,
                },
            )
            .await?;

        rotate_verifier_token(&self.verifiers, &verifier, &response).await?;

        let sent = response.body;
        let id = sent
            .request_id()
            .map(String::from)
            .ok_or_else(|| RelayError::Remote {
                service: "verifier",
                status: 200,
                message: "Presentation request response did not include an id".to_string(),
            })?;

        let stored = self
            .requests
            .create(NewPresentationRequest {
                id,
                verifier_uuid: verifier.uuid,
                holder_app_uuid: request.holder_app_uuid,
                metadata,
                issuers: sent.issuers,
                presentation_request: sent.presentation_request,
                deeplink: sent.deeplink,
                qr_code: sent.qr_code,
            })
            .await?;

        tracing::info!(request = %stored.uuid, id = %stored.id, "Created presentation request");
        Ok(stored)
    }
}

/// Presentation verification and relay
///
/// Three protocol versions share one flow: resolve the verifier, forward
/// the presentation, store a reissued token, reject unverified results,
/// save shared credentials, notify the user's realtime channel and build
/// a receipt.
///
/// - v1 takes a plaintext presentation and the verifier uuid from the query.
/// - v2 takes an encrypted presentation keyed by the request uuid.
/// - v3 takes an encrypted presentation keyed by the remote request id.
use crate::{
    channels::ChannelHub,
    db::models::{PresentationRequest, Verifier},
    error::{RelayError, RelayResult},
    metrics,
    remote::{
        models::{EncryptedVerificationRequest, PresentationKind, VerificationResult},
        RemoteResponse, VerifierClient,
    },
    services::{
        credential_info::{credentials, extract_credential_info, CredentialRefs},
        rotate_verifier_token,
    },
    store::{
        base_did, CredentialStore, IssuerStore, NewSharedCredential, PresentationRequestStore,
        UserStore, VerifierStore,
    },
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Event name published on a user's channel after a verified presentation
pub const PRESENTATION_EVENT: &str = "presentationVerified";

/// Body of `POST /presentationV2`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedPresentationV2 {
    pub presentation_request_uuid: String,
    pub encrypted_presentation: Value,
}

/// Identifiers of the request a v3 presentation answers
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRef {
    pub id: String,
    #[serde(default)]
    pub uuid: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationRequestInfo {
    pub presentation_request: RequestRef,
}

/// Body of `POST /presentationV3`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedPresentationV3 {
    pub presentation_request_info: PresentationRequestInfo,
    pub encrypted_presentation: Value,
}

/// What the relay tells the caller about a verified presentation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationReceiptInfo {
    pub subject_did: String,
    pub credential_types: Vec<String>,
    pub verifier_did: String,
    pub holder_app: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuers: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation_request_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation_request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResponse {
    pub is_verified: bool,
    #[serde(rename = "type")]
    pub kind: PresentationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation_receipt_info: Option<PresentationReceiptInfo>,
}

/// A verifier result that passed verification
struct Verified {
    kind: PresentationKind,
    presentation: Value,
}

#[derive(Clone)]
pub struct PresentationService {
    verifiers: VerifierStore,
    issuers: IssuerStore,
    users: UserStore,
    credentials: CredentialStore,
    requests: PresentationRequestStore,
    client: VerifierClient,
    channels: ChannelHub,
}

impl PresentationService {
    pub fn new(
        verifiers: VerifierStore,
        issuers: IssuerStore,
        users: UserStore,
        credentials: CredentialStore,
        requests: PresentationRequestStore,
        client: VerifierClient,
        channels: ChannelHub,
    ) -> Self {
        Self {
            verifiers,
            issuers,
            users,
            credentials,
            requests,
            client,
            channels,
        }
    }

    /// Verify a plaintext presentation (v1)
    pub async fn verify_v1(
        &self,
        verifier_uuid: Option<&str>,
        presentation: Value,
        version: &str,
    ) -> RelayResult<VerificationResponse> {
        let verifier_uuid = verifier_uuid
            .filter(|uuid| !uuid.is_empty())
            .ok_or_else(|| RelayError::Validation("Verifier query param is required.".to_string()))?;
        let verifier = self.verifiers.get(verifier_uuid).await?;

        let types: Vec<String> = presentation
            .get("type")
            .cloned()
            .and_then(|types| serde_json::from_value(types).ok())
            .unwrap_or_default();
        let submitted_kind = PresentationKind::from_types(&types);

        let response = match submitted_kind {
            PresentationKind::VerifiablePresentation => {
                self.client
                    .verify_presentation(&verifier.auth_token, version, &presentation)
                    .await?
            }
            _ => {
                self.client
                    .verify_no_presentation(&verifier.auth_token, version, &presentation)
                    .await?
            }
        };

        let verified = self
            .accept("v1", &verifier, response, submitted_kind, Some(presentation))
            .await?;
        self.save_shared_credentials("v1", &verifier, &verified).await?;

        // Plaintext presentations may name the request they answer
        let request = match verified
            .presentation
            .get("presentationRequestUuid")
            .and_then(Value::as_str)
        {
            Some(uuid) => match self.requests.get(uuid).await {
                Ok(request) => Some(request),
                Err(RelayError::NotFound(_)) => None,
                Err(e) => return Err(e),
            },
            None => None,
        };
        if let Some(request) = &request {
            self.notify(request, &verified).await;
        }

        metrics::record_presentation("v1", "verified");
        Ok(VerificationResponse {
            is_verified: true,
            kind: verified.kind,
            presentation_receipt_info: None,
        })
    }

    /// Verify an encrypted presentation keyed by request uuid (v2)
    pub async fn verify_v2(
        &self,
        body: EncryptedPresentationV2,
        version: &str,
    ) -> RelayResult<VerificationResponse> {
        let request = self.requests.get(&body.presentation_request_uuid).await?;
        let verifier = self.verifiers.get(&request.verifier_uuid).await?;

        let response = self
            .client
            .verify_encrypted_presentation(
                &verifier.auth_token,
                version,
                &EncryptedVerificationRequest {
                    encrypted_presentation: body.encrypted_presentation,
                    verifier: verifier.did.clone(),
                    encryption_private_key: verifier.encryption_private_key.clone(),
                },
            )
            .await?;

        let verified = self
            .accept("v2", &verifier, response, PresentationKind::VerifiablePresentation, None)
            .await?;
        self.save_shared_credentials("v2", &verifier, &verified).await?;
        self.notify(&request, &verified).await;

        let receipt = receipt(&verifier, &request, &verified)?;
        metrics::record_presentation("v2", "verified");
        Ok(VerificationResponse {
            is_verified: true,
            kind: verified.kind,
            presentation_receipt_info: Some(receipt),
        })
    }

    /// Verify an encrypted presentation keyed by remote request id (v3)
    ///
    /// Failures after the request is resolved, other than a negative
    /// verification, surface as a generic server error.
    pub async fn verify_v3(
        &self,
        body: EncryptedPresentationV3,
        version: &str,
    ) -> RelayResult<VerificationResponse> {
        let request_ref = body.presentation_request_info.presentation_request;
        if request_ref.id.is_empty() {
            return Err(RelayError::Validation(
                "presentationRequestInfo.presentationRequest.id is required".to_string(),
            ));
        }

        let request = self
            .requests
            .get_by_request_id(&request_ref.id)
            .await
            .map_err(|e| {
                tracing::error!(request_id = %request_ref.id, "Error loading presentation request: {}", e);
                e
            })?;
        let verifier = self.verifiers.get(&request.verifier_uuid).await?;

        self.relay_v3(&verifier, &request, request_ref, body.encrypted_presentation, version)
            .await
            .map_err(|e| match e {
                RelayError::VerificationFailed(_) => e,
                other => {
                    tracing::error!(
                        request_id = %request.id,
                        "Issue handling verifying a v3 presentation: {}",
                        other
                    );
                    metrics::record_presentation("v3", "error");
                    general_error(other)
                }
            })
    }

    async fn relay_v3(
        &self,
        verifier: &Verifier,
        request: &PresentationRequest,
        request_ref: RequestRef,
        encrypted_presentation: Value,
        version: &str,
    ) -> RelayResult<VerificationResponse> {
        let response = self
            .client
            .verify_presentation_v3(
                &verifier.auth_token,
                version,
                &EncryptedVerificationRequest {
                    encrypted_presentation,
                    verifier: verifier.did.clone(),
                    encryption_private_key: verifier.encryption_private_key.clone(),
                },
            )
            .await?;

        let verified = self
            .accept("v3", verifier, response, PresentationKind::VerifiablePresentation, None)
            .await?;
        self.save_shared_credentials("v3", verifier, &verified).await?;
        self.notify(request, &verified).await;

        let mut receipt = receipt(verifier, request, &verified)?;
        receipt.presentation_request_uuid = request_ref.uuid;
        receipt.presentation_request_id = Some(request_ref.id);

        metrics::record_presentation("v3", "verified");
        Ok(VerificationResponse {
            is_verified: true,
            kind: verified.kind,
            presentation_receipt_info: Some(receipt),
        })
    }

    /// Store a reissued token, then reject unverified results
    async fn accept(
        &self,
        version: &'static str,
        verifier: &Verifier,
        response: RemoteResponse<VerificationResult>,
        default_kind: PresentationKind,
        submitted: Option<Value>,
    ) -> RelayResult<Verified> {
        rotate_verifier_token(&self.verifiers, verifier, &response).await?;

        let result = response.body;
        tracing::info!(
            verifier = %verifier.uuid,
            is_verified = result.is_verified,
            "Response from verifier app ({})",
            version
        );

        if !result.is_verified {
            let message = result
                .message
                .unwrap_or_else(|| "presentation was not verified".to_string());
            tracing::warn!(verifier = %verifier.uuid, "Presentation verification failed: {}", message);
            metrics::record_presentation(version, "not_verified");
            return Err(RelayError::VerificationFailed(message));
        }

        let presentation = submitted
            .or(result.presentation)
            .unwrap_or_else(|| json!({}));
        let kind = result.kind.unwrap_or(default_kind);

        Ok(Verified { kind, presentation })
    }

    /// Persist each credential of a verifiable presentation as shared
    async fn save_shared_credentials(
        &self,
        version: &'static str,
        verifier: &Verifier,
        verified: &Verified,
    ) -> RelayResult<()> {
        if verified.kind != PresentationKind::VerifiablePresentation {
            return Ok(());
        }

        // Resolve every credential before writing any of them
        let mut batch = Vec::new();
        for credential in credentials(&verified.presentation) {
            let refs = CredentialRefs::from_value(&credential)?;
            let issuer = self.issuers.get_by_did(base_did(&refs.issuer)).await?;
            let subject_did = refs.subject_did()?;
            let user = self.users.get_by_did(base_did(&subject_did)).await?;

            batch.push(NewSharedCredential {
                issuer_uuid: issuer.uuid,
                verifier_uuid: verifier.uuid.clone(),
                user_uuid: user.uuid,
                credential,
            });
        }

        let saved = self.credentials.create_shared_all(batch).await?;
        for _ in &saved {
            metrics::record_shared_credential(version);
        }

        Ok(())
    }

    /// Push the plaintext result to the requesting user's channel
    async fn notify(&self, request: &PresentationRequest, verified: &Verified) {
        let Some(user_uuid) = request.user_uuid() else {
            return;
        };

        let delivered = self
            .channels
            .publish(
                user_uuid,
                PRESENTATION_EVENT,
                json!({
                    "isVerified": true,
                    "type": verified.kind,
                    "presentation": verified.presentation,
                    "presentationRequestUuid": request.uuid,
                }),
            )
            .await;

        tracing::debug!(channel = user_uuid, delivered, "Published verified presentation");
    }
}

fn receipt(
    verifier: &Verifier,
    request: &PresentationRequest,
    verified: &Verified,
) -> RelayResult<PresentationReceiptInfo> {
    let info = extract_credential_info(&verified.presentation)?;

    Ok(PresentationReceiptInfo {
        subject_did: info.subject_did,
        credential_types: info.credential_types,
        verifier_did: verifier.did.clone(),
        holder_app: request.holder_app_uuid.clone(),
        issuers: match verified.kind {
            PresentationKind::VerifiablePresentation => Some(request.issuers.0.clone()),
            _ => None,
        },
        presentation_request_uuid: None,
        presentation_request_id: None,
    })
}

/// Collapse a failure into an opaque 500
fn general_error(error: RelayError) -> RelayError {
    match error {
        RelayError::Remote { .. } => error,
        other => RelayError::Internal(format!("Issue handling verifying a v3 presentation: {}", other)),
    }
}

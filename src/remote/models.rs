/// Wire types exchanged with the remote issuer and verifier applications
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `/api/register` on both remote applications
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub name: String,
    pub customer_uuid: String,
    pub api_key: String,
}

/// A key pair as returned by registration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    pub private_key: String,
    #[serde(default)]
    pub public_key: Option<String>,
}

/// Keys returned by registration
///
/// Older verifier deployments return a flat `privateKey`; newer ones split
/// into `signing` and `encryption` pairs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationKeys {
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub signing: Option<KeyPair>,
    #[serde(default)]
    pub encryption: Option<KeyPair>,
}

impl RegistrationKeys {
    pub fn signing_private_key(&self) -> Option<&str> {
        self.signing
            .as_ref()
            .map(|pair| pair.private_key.as_str())
            .or(self.private_key.as_deref())
    }

    pub fn encryption_private_key(&self) -> Option<&str> {
        self.encryption.as_ref().map(|pair| pair.private_key.as_str())
    }
}

/// Issuer or verifier as registered remotely
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(default)]
    pub uuid: Option<String>,
    pub did: String,
    pub name: String,
    #[serde(default)]
    pub keys: RegistrationKeys,
}

/// Body of `/api/issueCredentials`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueCredentialRequest {
    pub credential_subject: Value,
    #[serde(rename = "type")]
    pub credential_type: Vec<String>,
    pub issuer: String,
    pub signing_private_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
}

/// Credential status values accepted by the issuer application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialStatus {
    Valid,
    Revoked,
}

/// Body of `/api/updateCredentialStatus`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatusRequest {
    pub credential_id: String,
    pub status: CredentialStatus,
}

/// Body of `/api/sendRequest`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequestBody {
    pub verifier: String,
    pub credential_requests: Value,
    pub signing_private_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder_app_uuid: Option<String>,
    pub metadata: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Response of `/api/sendRequest`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequestResponse {
    pub presentation_request: Value,
    #[serde(default)]
    pub issuers: Value,
    #[serde(default)]
    pub deeplink: Option<String>,
    #[serde(default)]
    pub qr_code: Option<String>,
}

impl SendRequestResponse {
    /// Remote identifier of the created request
    pub fn request_id(&self) -> Option<&str> {
        self.presentation_request
            .get("id")
            .or_else(|| self.presentation_request.get("uuid"))
            .and_then(Value::as_str)
    }
}

/// Body of `/api/verifyEncryptedPresentation` and the v3 `/api/verifyPresentation`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedVerificationRequest {
    pub encrypted_presentation: Value,
    pub verifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_private_key: Option<String>,
}

/// Presentation kinds reported by the verifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationKind {
    VerifiablePresentation,
    NoPresentation,
    DeclinedPresentation,
}

impl PresentationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresentationKind::VerifiablePresentation => "VerifiablePresentation",
            PresentationKind::NoPresentation => "NoPresentation",
            PresentationKind::DeclinedPresentation => "DeclinedPresentation",
        }
    }

    /// Classify a plaintext presentation by its `type` array
    pub fn from_types(types: &[String]) -> Self {
        if types.iter().any(|t| t == "NoPresentation") {
            PresentationKind::NoPresentation
        } else if types.iter().any(|t| t == "DeclinedPresentation") {
            PresentationKind::DeclinedPresentation
        } else {
            PresentationKind::VerifiablePresentation
        }
    }
}

/// Verifier result for a presentation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    #[serde(alias = "verifiedStatus")]
    pub is_verified: bool,
    #[serde(rename = "type", default)]
    pub kind: Option<PresentationKind>,
    #[serde(default)]
    pub presentation: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `/api/sendSms` and `/api/sendEmail`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeeplinkMessage {
    pub to: String,
    pub deeplink: String,
}

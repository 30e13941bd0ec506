/// Database row types
///
/// Every record has a generated `uuid` plus `created_at` / `updated_at`
/// timestamps owned by the store layer. JSON columns hold the opaque
/// payloads received from the remote applications.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow};

/// Customer company; supplies the API key used when registering issuers and verifiers
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub uuid: String,
    pub name: String,
    pub api_key: String,
    pub customer_uuid: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Issuer registered with the remote issuer application
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issuer {
    pub uuid: String,
    pub did: String,
    pub private_key: String,
    pub auth_token: String,
    pub name: String,
    pub company_uuid: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Verifier registered with the remote verifier application
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verifier {
    pub uuid: String,
    pub did: String,
    pub private_key: String,
    pub encryption_private_key: Option<String>,
    pub auth_token: String,
    pub name: String,
    pub company_uuid: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// End user, identified remotely by DID
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uuid: String,
    pub did: Option<String>,
    pub name: String,
    pub company_uuid: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wallet application that presentation requests are addressed to
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolderApp {
    pub uuid: String,
    pub name: String,
    pub uri_scheme: String,
    pub deeplink_button_img: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Credential issued by one of our issuers to one of our users
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCredential {
    pub uuid: String,
    pub issuer_uuid: String,
    pub user_uuid: String,
    pub credential: Json<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Credential a user shared with one of our verifiers
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedCredential {
    pub uuid: String,
    pub issuer_uuid: String,
    pub verifier_uuid: String,
    pub user_uuid: String,
    pub credential: Json<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Presentation request created through the remote verifier
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationRequest {
    pub uuid: String,
    /// Identifier assigned by the remote verifier application
    pub id: String,
    pub verifier_uuid: String,
    pub holder_app_uuid: Option<String>,
    pub metadata: Json<Value>,
    /// Map of issuer DID to `{ did, name }`
    pub issuers: Json<Value>,
    pub presentation_request: Json<Value>,
    pub deeplink: Option<String>,
    pub qr_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PresentationRequest {
    /// User uuid carried in the request metadata, used to pick the realtime channel
    pub fn user_uuid(&self) -> Option<&str> {
        self.metadata
            .0
            .get("userUuid")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(metadata: Value) -> PresentationRequest {
        let now = Utc::now();
        PresentationRequest {
            uuid: "req-uuid".into(),
            id: "req-id".into(),
            verifier_uuid: "verifier".into(),
            holder_app_uuid: None,
            metadata: Json(metadata),
            issuers: Json(json!({})),
            presentation_request: Json(json!({})),
            deeplink: None,
            qr_code: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_user_uuid_from_metadata() {
        assert_eq!(request(json!({ "userUuid": "abc" })).user_uuid(), Some("abc"));
        assert_eq!(request(json!({ "userUuid": "" })).user_uuid(), None);
        assert_eq!(request(json!({})).user_uuid(), None);
    }

    #[test]
    fn test_camel_case_serialization() {
        let json = serde_json::to_value(request(json!({}))).unwrap();
        assert!(json.get("verifierUuid").is_some());
        assert!(json.get("presentationRequest").is_some());
        assert!(json.get("qrCode").is_some());
    }
}

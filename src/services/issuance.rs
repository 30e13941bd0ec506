/// Credential issuance and status updates through the issuer application
use crate::{
    db::models::IssuedCredential,
    error::{RelayError, RelayResult},
    remote::{
        models::{CredentialStatus, CredentialStatusRequest, IssueCredentialRequest},
        IssuerClient,
    },
    services::rotate_issuer_token,
    store::{CredentialStore, IssuerStore, NewIssuedCredential, UserStore},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use validator::Validate;

/// Body of `POST /issuedCredential`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IssueCredential {
    #[validate(length(min = 1, message = "issuerUuid is required"))]
    pub issuer_uuid: String,
    #[validate(length(min = 1, message = "userUuid is required"))]
    pub user_uuid: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "at least one credential type is required"))]
    pub credential_type: Vec<String>,
    /// Claims about the user; the subject id is filled in from the user's DID
    #[serde(default)]
    pub claims: Map<String, Value>,
    pub expiration_date: Option<DateTime<Utc>>,
}

/// Body of `PATCH /credentialStatus/:credentialId`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatusUpdate {
    #[validate(length(min = 1, message = "issuerUuid is required"))]
    pub issuer_uuid: String,
    pub status: CredentialStatus,
}

#[derive(Clone)]
pub struct IssuanceService {
    issuers: IssuerStore,
    users: UserStore,
    credentials: CredentialStore,
    client: IssuerClient,
}

impl IssuanceService {
    pub fn new(
        issuers: IssuerStore,
        users: UserStore,
        credentials: CredentialStore,
        client: IssuerClient,
    ) -> Self {
        Self {
            issuers,
            users,
            credentials,
            client,
        }
    }

    /// Have the issuer sign a credential for a user and keep a copy
    pub async fn issue(
        &self,
        request: IssueCredential,
        version: &str,
    ) -> RelayResult<IssuedCredential> {
        let issuer = self.issuers.get(&request.issuer_uuid).await?;
        let user = self.users.get(&request.user_uuid).await?;
        let subject_did = user.did.clone().ok_or_else(|| {
            RelayError::Validation(format!("User {} has no did to issue to", user.uuid))
        })?;

        let mut subject = request.claims;
        subject.insert("id".to_string(), Value::String(subject_did));

        let response = self
            .client
            .issue_credential(
                &issuer.auth_token,
                version,
                &IssueCredentialRequest {
                    credential_subject: Value::Object(subject),
                    credential_type: request.credential_type,
                    issuer: issuer.did.clone(),
                    signing_private_key: issuer.private_key.clone(),
                    expiration_date: request.expiration_date,
                },
            )
            .await?;

        rotate_issuer_token(&self.issuers, &issuer, &response).await?;

        let issued = self
            .credentials
            .create_issued(NewIssuedCredential {
                issuer_uuid: issuer.uuid.clone(),
                user_uuid: user.uuid,
                credential: response.body,
            })
            .await?;

        tracing::info!(issuer = %issuer.uuid, credential = %issued.uuid, "Issued credential");
        Ok(issued)
    }

    /// Mark a credential valid or revoked; returns the issuer's reply
    pub async fn update_status(
        &self,
        credential_id: &str,
        update: CredentialStatusUpdate,
        version: &str,
    ) -> RelayResult<Value> {
        let issuer = self.issuers.get(&update.issuer_uuid).await?;

        let response = self
            .client
            .update_credential_status(
                &issuer.auth_token,
                version,
                &CredentialStatusRequest {
                    credential_id: credential_id.to_string(),
                    status: update.status,
                },
            )
            .await?;

        rotate_issuer_token(&self.issuers, &issuer, &response).await?;

        tracing::info!(credential_id, status = ?update.status, "Updated credential status");
        Ok(response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ServerConfig, db::memory_pool, store::fixtures};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(db: &sqlx::SqlitePool, issuer_app: &MockServer) -> IssuanceService {
        let config = ServerConfig::for_testing(&issuer_app.uri(), "http://127.0.0.1:9");
        IssuanceService::new(
            IssuerStore::new(db.clone()),
            UserStore::new(db.clone()),
            CredentialStore::new(db.clone()),
            IssuerClient::new(&config.remote).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_issue_persists_and_rotates_token() {
        let db = memory_pool().await;
        let company = fixtures::company(&db).await;
        let issuer = fixtures::issuer(&db, &company, "did:unum:issuer").await;
        let user = fixtures::user(&db, &company, "did:unum:user").await;
        let issuer_app = MockServer::start().await;

        let signed = json!({
            "id": "0c93beb0-2605-4650-b698-3fd92eb110b9",
            "issuer": "did:unum:issuer",
            "credentialSubject": { "id": "did:unum:user", "value": "dummy value" },
            "type": ["VerifiableCredential", "DummyCredential"]
        });

        Mock::given(method("POST"))
            .and(path("/api/issueCredentials"))
            .and(header("authorization", "Bearer issuer-token"))
            .and(body_partial_json(json!({
                "credentialSubject": { "id": "did:unum:user", "value": "dummy value" },
                "type": ["DummyCredential"],
                "issuer": "did:unum:issuer"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-auth-token", "Bearer rotated")
                    .set_body_json(signed.clone()),
            )
            .expect(1)
            .mount(&issuer_app)
            .await;

        let mut claims = Map::new();
        claims.insert("value".into(), json!("dummy value"));

        let issued = service(&db, &issuer_app)
            .issue(
                IssueCredential {
                    issuer_uuid: issuer.uuid.clone(),
                    user_uuid: user.uuid.clone(),
                    credential_type: vec!["DummyCredential".into()],
                    claims,
                    expiration_date: None,
                },
                "3.0.0",
            )
            .await
            .unwrap();

        assert_eq!(issued.credential.0, signed);
        assert_eq!(issued.user_uuid, user.uuid);

        let reloaded = IssuerStore::new(db).get(&issuer.uuid).await.unwrap();
        assert_eq!(reloaded.auth_token, "Bearer rotated");
    }

    #[tokio::test]
    async fn test_issue_requires_user_did() {
        let db = memory_pool().await;
        let company = fixtures::company(&db).await;
        let issuer = fixtures::issuer(&db, &company, "did:unum:issuer").await;
        let user = UserStore::new(db.clone())
            .create(crate::store::NewUser {
                did: None,
                name: "No Did".into(),
                company_uuid: company.uuid.clone(),
            })
            .await
            .unwrap();
        let issuer_app = MockServer::start().await;

        let result = service(&db, &issuer_app)
            .issue(
                IssueCredential {
                    issuer_uuid: issuer.uuid,
                    user_uuid: user.uuid,
                    credential_type: vec!["DummyCredential".into()],
                    claims: Map::new(),
                    expiration_date: None,
                },
                "3.0.0",
            )
            .await;

        assert!(matches!(result, Err(RelayError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_status_forwards_credential_id() {
        let db = memory_pool().await;
        let company = fixtures::company(&db).await;
        let issuer = fixtures::issuer(&db, &company, "did:unum:issuer").await;
        let issuer_app = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/updateCredentialStatus"))
            .and(header("version", "2.0.0"))
            .and(body_partial_json(json!({ "credentialId": "cred-1", "status": "revoked" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&issuer_app)
            .await;

        let reply = service(&db, &issuer_app)
            .update_status(
                "cred-1",
                CredentialStatusUpdate {
                    issuer_uuid: issuer.uuid.clone(),
                    status: CredentialStatus::Revoked,
                },
                "2.0.0",
            )
            .await
            .unwrap();

        assert_eq!(reply["success"], true);
        // No x-auth-token header: the stored token stays put
        let reloaded = IssuerStore::new(db).get(&issuer.uuid).await.unwrap();
        assert_eq!(reloaded.auth_token, issuer.auth_token);
    }
}

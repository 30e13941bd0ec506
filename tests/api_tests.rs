//! Router-level tests
//!
//! Each test builds a fresh in-memory relay with the issuer and verifier
//! applications stubbed by wiremock, then drives the router with `oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use credential_relay::{build_router, config::ServerConfig, AppContext};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestRelay {
    ctx: AppContext,
    issuer_app: MockServer,
    verifier_app: MockServer,
}

impl TestRelay {
    async fn start() -> Self {
        let issuer_app = MockServer::start().await;
        let verifier_app = MockServer::start().await;
        let config = ServerConfig::for_testing(&issuer_app.uri(), &verifier_app.uri());
        let ctx = AppContext::new(config).await.unwrap();
        Self {
            ctx,
            issuer_app,
            verifier_app,
        }
    }

    fn app(&self) -> Router {
        build_router(self.ctx.clone())
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request("POST", uri, body)).await
    }

    async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request("PATCH", uri, body)).await
    }

    async fn create_company(&self) -> Value {
        let (status, company) = self
            .post(
                "/company",
                json!({ "name": "ACME", "apiKey": "acme-api-key", "customerUuid": "acme-customer" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        company
    }

    async fn register_issuer(&self) -> Value {
        Mock::given(method("POST"))
            .and(path("/api/register"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-auth-token", "Bearer issuer-token")
                    .set_body_json(json!({
                        "uuid": "remote-issuer-uuid",
                        "did": "did:unum:issuer",
                        "name": "ACME Issuer",
                        "keys": { "signing": { "privateKey": "issuer-signing-key" } }
                    })),
            )
            .mount(&self.issuer_app)
            .await;

        let (status, issuer) = self.post("/issuer", json!({ "name": "ACME Issuer" })).await;
        assert_eq!(status, StatusCode::CREATED);
        issuer
    }

    async fn register_verifier(&self) -> Value {
        Mock::given(method("POST"))
            .and(path("/api/register"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-auth-token", "Bearer verifier-token")
                    .set_body_json(json!({
                        "did": "did:unum:verifier",
                        "name": "ACME Verifier",
                        "keys": {
                            "signing": { "privateKey": "verifier-signing-key" },
                            "encryption": { "privateKey": "verifier-encryption-key" }
                        }
                    })),
            )
            .mount(&self.verifier_app)
            .await;

        let (status, verifier) = self
            .post("/verifier", json!({ "name": "ACME Verifier" }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        verifier
    }

    async fn create_user(&self, company: &Value, did: &str) -> Value {
        let (status, user) = self
            .post(
                "/user",
                json!({ "name": "Jane", "did": did, "companyUuid": company["uuid"] }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        user
    }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn presentation() -> Value {
    json!({
        "type": ["VerifiablePresentation"],
        "holder": "did:unum:user",
        "verifiableCredential": [{
            "id": "credential-1",
            "issuer": "did:unum:issuer#key-1",
            "credentialSubject": { "id": "did:unum:user#key-2", "value": "dummy" },
            "type": ["VerifiableCredential", "DummyCredential"]
        }]
    })
}

// -- Health -------------------------------------------------------------------

#[tokio::test]
async fn test_health_reports_database() {
    let relay = TestRelay::start().await;
    let (status, body) = relay.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["status"], "healthy");
    assert_eq!(body["realtimeConnections"], 0);
}

#[tokio::test]
async fn test_metrics_exposition() {
    let relay = TestRelay::start().await;
    relay.get("/health").await;

    let response = relay
        .app()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("relay_http_requests_total"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let relay = TestRelay::start().await;
    let (status, body) = relay.get("/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}

// -- Company ------------------------------------------------------------------

#[tokio::test]
async fn test_company_lifecycle() {
    let relay = TestRelay::start().await;
    let company = relay.create_company().await;
    let uuid = company["uuid"].as_str().unwrap();
    assert_eq!(company["name"], "ACME");

    let (status, fetched) = relay.get(&format!("/company/{}", uuid)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["apiKey"], "acme-api-key");

    let (status, patched) = relay
        .patch(&format!("/company/{}", uuid), json!({ "name": "ACME Corp" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["name"], "ACME Corp");

    let (_, all) = relay.get("/company").await;
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_company_accepts_legacy_field_names() {
    let relay = TestRelay::start().await;
    let (status, company) = relay
        .post(
            "/company",
            json!({ "name": "ACME", "unumIdApiKey": "legacy-key", "unumIdCustomerUuid": "legacy-customer" }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(company["apiKey"], "legacy-key");
    assert_eq!(company["customerUuid"], "legacy-customer");
}

#[tokio::test]
async fn test_company_validation_and_missing() {
    let relay = TestRelay::start().await;
    let (status, body) = relay
        .post("/company", json!({ "name": "", "apiKey": "k", "customerUuid": "c" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidRequest");

    let (status, body) = relay.get("/company/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}

// -- Registration -------------------------------------------------------------

#[tokio::test]
async fn test_register_issuer_and_verifier() {
    let relay = TestRelay::start().await;
    let company = relay.create_company().await;

    let issuer = relay.register_issuer().await;
    assert_eq!(issuer["did"], "did:unum:issuer");
    assert_eq!(issuer["companyUuid"], company["uuid"]);

    let verifier = relay.register_verifier().await;
    assert_eq!(verifier["did"], "did:unum:verifier");

    let (_, found) = relay.get("/verifier?did=did:unum:verifier").await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    let (_, none) = relay.get("/issuer?did=did:unum:other").await;
    assert!(none.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_register_without_company_fails() {
    let relay = TestRelay::start().await;
    let (status, body) = relay.post("/issuer", json!({ "name": "ACME Issuer" })).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}

#[tokio::test]
async fn test_register_remote_failure_is_general_error() {
    let relay = TestRelay::start().await;
    relay.create_company().await;

    Mock::given(method("POST"))
        .and(path("/api/register"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "message": "bad key" })))
        .mount(&relay.verifier_app)
        .await;

    let (status, body) = relay
        .post("/verifier", json!({ "name": "ACME Verifier" }))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "GeneralError");
}

// -- Issuance -----------------------------------------------------------------

#[tokio::test]
async fn test_issue_credential_and_rotate_token() {
    let relay = TestRelay::start().await;
    let company = relay.create_company().await;
    let issuer = relay.register_issuer().await;
    let user = relay.create_user(&company, "did:unum:user").await;

    Mock::given(method("POST"))
        .and(path("/api/issueCredentials"))
        .and(header("authorization", "Bearer issuer-token"))
        .and(header("version", "3.0.0"))
        .and(body_partial_json(json!({
            "credentialSubject": { "id": "did:unum:user", "value": "dummy" },
            "type": ["DummyCredential"],
            "issuer": "did:unum:issuer"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-auth-token", "Bearer rotated-token")
                .set_body_json(json!({
                    "id": "credential-1",
                    "issuer": "did:unum:issuer",
                    "type": ["VerifiableCredential", "DummyCredential"]
                })),
        )
        .expect(1)
        .mount(&relay.issuer_app)
        .await;

    let (status, credential) = relay
        .post(
            "/issuedCredential",
            json!({
                "issuerUuid": issuer["uuid"],
                "userUuid": user["uuid"],
                "type": ["DummyCredential"],
                "claims": { "value": "dummy" }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(credential["issuerUuid"], issuer["uuid"]);

    let (_, stored) = relay
        .get(&format!("/issuer/{}", issuer["uuid"].as_str().unwrap()))
        .await;
    assert_eq!(stored["authToken"], "Bearer rotated-token");

    let (_, issued) = relay
        .get(&format!("/issuedCredential?userUuid={}", user["uuid"].as_str().unwrap()))
        .await;
    assert_eq!(issued.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_credential_status_update_forwards_version_header() {
    let relay = TestRelay::start().await;
    relay.create_company().await;
    let issuer = relay.register_issuer().await;

    Mock::given(method("POST"))
        .and(path("/api/updateCredentialStatus"))
        .and(header("version", "2.0.0"))
        .and(body_partial_json(json!({ "credentialId": "credential-1", "status": "revoked" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&relay.issuer_app)
        .await;

    let request = Request::builder()
        .method("PATCH")
        .uri("/credentialStatus/credential-1")
        .header("content-type", "application/json")
        .header("version", "2.0.0")
        .body(Body::from(
            json!({ "issuerUuid": issuer["uuid"], "status": "revoked" }).to_string(),
        ))
        .unwrap();
    let (status, body) = relay.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

// -- Presentation requests ----------------------------------------------------

#[tokio::test]
async fn test_create_presentation_request() {
    let relay = TestRelay::start().await;
    relay.create_company().await;
    let verifier = relay.register_verifier().await;

    Mock::given(method("POST"))
        .and(path("/api/sendRequest"))
        .and(header("authorization", "Bearer verifier-token"))
        .and(body_partial_json(json!({
            "verifier": "did:unum:verifier",
            "signingPrivateKey": "verifier-signing-key"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "presentationRequest": { "id": "remote-request-id", "uuid": "remote-request-uuid" },
            "issuers": {},
            "deeplink": "acme://unumid/presentationRequest/remote-request-id"
        })))
        .expect(1)
        .mount(&relay.verifier_app)
        .await;

    let (status, request) = relay
        .post(
            "/presentationRequest",
            json!({
                "verifierUuid": verifier["uuid"],
                "credentialRequests": [{ "type": "DummyCredential", "issuers": ["did:unum:issuer"] }],
                "metadata": { "userUuid": "user-1" }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["id"], "remote-request-id");

    let (_, listed) = relay
        .get(&format!(
            "/presentationRequest?verifierUuid={}",
            verifier["uuid"].as_str().unwrap()
        ))
        .await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

// -- Presentations ------------------------------------------------------------

#[tokio::test]
async fn test_presentation_requires_verifier_param() {
    let relay = TestRelay::start().await;
    let (status, body) = relay.post("/presentation", presentation()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Verifier query param is required.");
}

#[tokio::test]
async fn test_presentation_saves_shared_credentials() {
    let relay = TestRelay::start().await;
    let company = relay.create_company().await;
    relay.register_issuer().await;
    let verifier = relay.register_verifier().await;
    let user = relay.create_user(&company, "did:unum:user").await;

    Mock::given(method("POST"))
        .and(path("/api/verifyPresentation"))
        .and(header("version", "3.0.0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "isVerified": true })),
        )
        .expect(1)
        .mount(&relay.verifier_app)
        .await;

    let verifier_uuid = verifier["uuid"].as_str().unwrap();
    let (status, body) = relay
        .post(&format!("/presentation?verifier={}", verifier_uuid), presentation())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isVerified"], true);
    assert_eq!(body["type"], "VerifiablePresentation");

    let (_, shared) = relay
        .get(&format!("/sharedCredential?verifierUuid={}", verifier_uuid))
        .await;
    let shared = shared.as_array().unwrap();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0]["userUuid"], user["uuid"]);
}

#[tokio::test]
async fn test_declined_presentation_is_not_shared() {
    let relay = TestRelay::start().await;
    relay.create_company().await;
    let verifier = relay.register_verifier().await;

    Mock::given(method("POST"))
        .and(path("/api/verifyNoPresentation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "isVerified": true })))
        .expect(1)
        .mount(&relay.verifier_app)
        .await;

    let verifier_uuid = verifier["uuid"].as_str().unwrap();
    let (status, body) = relay
        .post(
            &format!("/presentation?verifier={}", verifier_uuid),
            json!({ "type": ["DeclinedPresentation"], "holder": "did:unum:user" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "DeclinedPresentation");

    let (_, shared) = relay.get("/sharedCredential").await;
    assert!(shared.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_unverified_presentation_is_rejected() {
    let relay = TestRelay::start().await;
    relay.create_company().await;
    let verifier = relay.register_verifier().await;

    Mock::given(method("POST"))
        .and(path("/api/verifyPresentation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isVerified": false,
            "message": "signature mismatch"
        })))
        .mount(&relay.verifier_app)
        .await;

    let (status, body) = relay
        .post(
            &format!("/presentation?verifier={}", verifier["uuid"].as_str().unwrap()),
            presentation(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VerificationFailed");
}

#[tokio::test]
async fn test_encrypted_presentation_v3_returns_receipt() {
    let relay = TestRelay::start().await;
    let company = relay.create_company().await;
    relay.register_issuer().await;
    let verifier = relay.register_verifier().await;
    let user = relay.create_user(&company, "did:unum:user").await;

    Mock::given(method("POST"))
        .and(path("/api/sendRequest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "presentationRequest": { "id": "remote-request-id", "uuid": "remote-request-uuid" },
            "issuers": { "did:unum:issuer": { "did": "did:unum:issuer", "name": "ACME Issuer" } }
        })))
        .mount(&relay.verifier_app)
        .await;
    let (status, _) = relay
        .post(
            "/presentationRequest",
            json!({
                "verifierUuid": verifier["uuid"],
                "credentialRequests": [{ "type": "DummyCredential", "issuers": ["did:unum:issuer"] }],
                "metadata": { "userUuid": user["uuid"] }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    Mock::given(method("POST"))
        .and(path("/api/verifyPresentation"))
        .and(body_partial_json(json!({ "encryptedPresentation": { "data": "ciphertext" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "isVerified": true,
            "type": "VerifiablePresentation",
            "presentation": presentation()
        })))
        .expect(1)
        .mount(&relay.verifier_app)
        .await;

    let (status, body) = relay
        .post(
            "/presentationV3",
            json!({
                "encryptedPresentation": { "data": "ciphertext" },
                "presentationRequestInfo": {
                    "presentationRequest": { "id": "remote-request-id", "uuid": "remote-request-uuid" }
                }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isVerified"], true);
    let receipt = &body["presentationReceiptInfo"];
    assert_eq!(receipt["subjectDid"], "did:unum:user#key-2");
    assert_eq!(receipt["verifierDid"], "did:unum:verifier");
    assert_eq!(receipt["credentialTypes"], json!(["DummyCredential"]));
}

#[tokio::test]
async fn test_encrypted_presentation_v3_remote_failure() {
    let relay = TestRelay::start().await;
    relay.create_company().await;
    let verifier = relay.register_verifier().await;

    Mock::given(method("POST"))
        .and(path("/api/sendRequest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "presentationRequest": { "id": "remote-request-id" },
            "issuers": {}
        })))
        .mount(&relay.verifier_app)
        .await;
    let (status, _) = relay
        .post(
            "/presentationRequest",
            json!({ "verifierUuid": verifier["uuid"], "credentialRequests": [] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    Mock::given(method("POST"))
        .and(path("/api/verifyPresentation"))
        .respond_with(ResponseTemplate::new(503).set_body_string("verifier unavailable"))
        .expect(1)
        .mount(&relay.verifier_app)
        .await;

    let (status, body) = relay
        .post(
            "/presentationV3",
            json!({
                "encryptedPresentation": { "data": "ciphertext" },
                "presentationRequestInfo": { "presentationRequest": { "id": "remote-request-id" } }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "GeneralError");
    assert!(body["message"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn test_encrypted_presentation_v2_unknown_request() {
    let relay = TestRelay::start().await;
    let (status, body) = relay
        .post(
            "/presentationV2",
            json!({
                "encryptedPresentation": { "data": "ciphertext" },
                "presentationRequestUuid": "missing-request"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}

// -- Messaging ----------------------------------------------------------------

#[tokio::test]
async fn test_sms_uses_default_version() {
    let relay = TestRelay::start().await;
    relay.create_company().await;
    relay.register_verifier().await;

    Mock::given(method("POST"))
        .and(path("/api/sendSms"))
        .and(header("version", "3.0.0"))
        .and(header("authorization", "Bearer verifier-token"))
        .and(body_partial_json(json!({ "to": "+15555550100" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&relay.verifier_app)
        .await;

    let (status, body) = relay
        .post(
            "/sms",
            json!({ "to": "+15555550100", "deeplink": "acme://unumid/presentationRequest/1" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_email_rejects_bad_address() {
    let relay = TestRelay::start().await;
    let (status, body) = relay
        .post("/email", json!({ "to": "not-an-email", "deeplink": "acme://x" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidRequest");
}

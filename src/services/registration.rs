/// Issuer and verifier registration with the remote applications
use crate::{
    db::models::{Company, Issuer, Verifier},
    error::{RelayError, RelayResult},
    remote::{
        models::{Registration, RegistrationRequest},
        IssuerClient, RemoteResponse, VerifierClient,
    },
    store::{CompanyStore, IssuerStore, NewIssuer, NewVerifier, VerifierStore},
};
use serde::Deserialize;
use validator::Validate;

/// Body of `POST /issuer`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterIssuer {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    /// Owning company; defaults to the first company
    pub company_uuid: Option<String>,
}

/// Body of `POST /verifier`
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterVerifier {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub company_uuid: Option<String>,
}

#[derive(Clone)]
pub struct RegistrationService {
    companies: CompanyStore,
    issuers: IssuerStore,
    verifiers: VerifierStore,
    issuer_client: IssuerClient,
    verifier_client: VerifierClient,
}

impl RegistrationService {
    pub fn new(
        companies: CompanyStore,
        issuers: IssuerStore,
        verifiers: VerifierStore,
        issuer_client: IssuerClient,
        verifier_client: VerifierClient,
    ) -> Self {
        Self {
            companies,
            issuers,
            verifiers,
            issuer_client,
            verifier_client,
        }
    }

    async fn company(&self, company_uuid: Option<&str>) -> RelayResult<Company> {
        match company_uuid {
            Some(uuid) => self.companies.get(uuid).await,
            None => self.companies.first().await,
        }
    }

    /// Register an issuer remotely and store its keys and token
    pub async fn register_issuer(&self, request: RegisterIssuer) -> RelayResult<Issuer> {
        let company = self.company(request.company_uuid.as_deref()).await?;

        let response = self
            .issuer_client
            .register(&RegistrationRequest {
                name: request.name,
                customer_uuid: company.customer_uuid.clone(),
                api_key: company.api_key.clone(),
            })
            .await?;

        let (registration, auth_token) = registration_parts("issuer", response)?;
        let private_key = signing_key("issuer", &registration)?;

        let issuer = self
            .issuers
            .create(NewIssuer {
                did: registration.did,
                private_key,
                auth_token,
                name: registration.name,
                company_uuid: company.uuid,
            })
            .await?;

        tracing::info!(issuer = %issuer.uuid, did = %issuer.did, "Registered issuer");
        Ok(issuer)
    }

    /// Register a verifier remotely and store its keys and token
    pub async fn register_verifier(&self, request: RegisterVerifier) -> RelayResult<Verifier> {
        let company = self.company(request.company_uuid.as_deref()).await?;

        let response = self
            .verifier_client
            .register(&RegistrationRequest {
                name: request.name,
                customer_uuid: company.customer_uuid.clone(),
                api_key: company.api_key.clone(),
            })
            .await?;

        let (registration, auth_token) = registration_parts("verifier", response)?;
        let private_key = signing_key("verifier", &registration)?;
        let encryption_private_key = registration
            .keys
            .encryption_private_key()
            .map(String::from);

        let verifier = self
            .verifiers
            .create(NewVerifier {
                did: registration.did,
                private_key,
                encryption_private_key,
                auth_token,
                name: registration.name,
                company_uuid: company.uuid,
            })
            .await?;

        tracing::info!(verifier = %verifier.uuid, did = %verifier.did, "Registered verifier");
        Ok(verifier)
    }
}

fn registration_parts(
    service: &'static str,
    response: RemoteResponse<Registration>,
) -> RelayResult<(Registration, String)> {
    match response.auth_token.filter(|token| !token.is_empty()) {
        Some(token) => Ok((response.body, token)),
        None => Err(RelayError::Remote {
            service,
            status: 200,
            message: "Registration response did not include an auth token".to_string(),
        }),
    }
}

fn signing_key(service: &'static str, registration: &Registration) -> RelayResult<String> {
    registration
        .keys
        .signing_private_key()
        .map(String::from)
        .ok_or_else(|| RelayError::Remote {
            service,
            status: 200,
            message: "Registration response did not include a signing key".to_string(),
        })
}

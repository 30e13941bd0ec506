/// Workflows that combine the stores with the remote applications
///
/// Handlers stay thin: they validate input, pick the API version and call
/// one method here. Every workflow that talks to a remote application
/// persists a reissued auth token before returning.

pub mod credential_info;
pub mod issuance;
pub mod messaging;
pub mod presentation;
pub mod presentation_request;
pub mod registration;

pub use issuance::{CredentialStatusUpdate, IssuanceService, IssueCredential};
pub use messaging::{EmailRequest, MessagingService, SmsRequest};
pub use presentation::{
    EncryptedPresentationV2, EncryptedPresentationV3, PresentationReceiptInfo,
    PresentationService, VerificationResponse,
};
pub use presentation_request::{CreatePresentationRequest, PresentationRequestService};
pub use registration::{RegisterIssuer, RegisterVerifier, RegistrationService};

use crate::{
    db::models::{Issuer, Verifier},
    error::RelayResult,
    metrics,
    remote::RemoteResponse,
    store::{IssuerStore, VerifierStore},
};

/// Persist an issuer token reissued through `x-auth-token`
pub(crate) async fn rotate_issuer_token<T>(
    issuers: &IssuerStore,
    issuer: &Issuer,
    response: &RemoteResponse<T>,
) -> RelayResult<()> {
    if let Some(token) = response.rotated_token(&issuer.auth_token) {
        issuers.update_auth_token(&issuer.uuid, token).await?;
        metrics::record_auth_token_rotation("issuer");
        tracing::debug!(issuer = %issuer.uuid, "Stored reissued issuer auth token");
    }
    Ok(())
}

/// Persist a verifier token reissued through `x-auth-token`
pub(crate) async fn rotate_verifier_token<T>(
    verifiers: &VerifierStore,
    verifier: &Verifier,
    response: &RemoteResponse<T>,
) -> RelayResult<()> {
    if let Some(token) = response.rotated_token(&verifier.auth_token) {
        verifiers.update_auth_token(&verifier.uuid, token).await?;
        metrics::record_auth_token_rotation("verifier");
        tracing::debug!(verifier = %verifier.uuid, "Stored reissued verifier auth token");
    }
    Ok(())
}

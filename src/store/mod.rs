/// Entity stores
///
/// One store per entity over the shared SQLite pool. `get*` lookups fail
/// with [`RelayError::NotFound`](crate::error::RelayError::NotFound) so
/// handlers can propagate them with `?`.

pub mod company;
pub mod credential;
pub mod holder_app;
pub mod issuer;
pub mod presentation_request;
pub mod user;
pub mod verifier;

pub use company::{CompanyPatch, CompanyStore, NewCompany};
pub use credential::{CredentialStore, NewIssuedCredential, NewSharedCredential};
pub use holder_app::{HolderAppStore, NewHolderApp};
pub use issuer::{IssuerPatch, IssuerStore, NewIssuer};
pub use presentation_request::{NewPresentationRequest, PresentationRequestStore};
pub use user::{NewUser, UserPatch, UserStore};
pub use verifier::{NewVerifier, VerifierPatch, VerifierStore};

/// Strip a key fragment (`#...`) from a DID; stored DIDs never carry one
pub fn base_did(did: &str) -> &str {
    did.split('#').next().unwrap_or(did)
}

/// Generate a new record identifier
pub(crate) fn new_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::db::models::{Company, Issuer, User, Verifier};
    use sqlx::SqlitePool;

    pub async fn company(db: &SqlitePool) -> Company {
        CompanyStore::new(db.clone())
            .create(NewCompany {
                name: "ACME, Inc.".into(),
                api_key: "3n5jhT2vXDEEXlRj09oI9pP6DmWNXNCghUMC/ybK2Lw=".into(),
                customer_uuid: "8125068d-e8c9-4706-83a0-be1485bf7265".into(),
            })
            .await
            .unwrap()
    }

    pub async fn issuer(db: &SqlitePool, company: &Company, did: &str) -> Issuer {
        IssuerStore::new(db.clone())
            .create(NewIssuer {
                did: did.into(),
                private_key: "issuer-private-key".into(),
                auth_token: "Bearer issuer-token".into(),
                name: "ACME Issuer".into(),
                company_uuid: company.uuid.clone(),
            })
            .await
            .unwrap()
    }

    pub async fn verifier(db: &SqlitePool, company: &Company, did: &str) -> Verifier {
        VerifierStore::new(db.clone())
            .create(NewVerifier {
                did: did.into(),
                private_key: "verifier-private-key".into(),
                encryption_private_key: Some("verifier-encryption-key".into()),
                auth_token: "verifier-token".into(),
                name: "ACME Verifier".into(),
                company_uuid: company.uuid.clone(),
            })
            .await
            .unwrap()
    }

    pub async fn user(db: &SqlitePool, company: &Company, did: &str) -> User {
        UserStore::new(db.clone())
            .create(NewUser {
                did: Some(did.into()),
                name: "Testy McTesterson".into(),
                company_uuid: company.uuid.clone(),
            })
            .await
            .unwrap()
    }
}

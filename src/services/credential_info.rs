/// Reading the parts of a credential the relay cares about
///
/// Credentials are otherwise opaque. Only the issuer DID, the subject DID
/// and the type list are read, to link shared credentials to stored
/// issuers and users and to build presentation receipts.
use crate::error::{RelayError, RelayResult};
use serde::Deserialize;
use serde_json::Value;

const BASE_CREDENTIAL_TYPE: &str = "VerifiableCredential";

/// Subject of a credential
#[derive(Debug, Clone, Deserialize)]
pub struct Subject {
    pub id: String,
}

/// `credentialSubject` as sent by holders
///
/// Encrypted presentations decrypt to credentials whose subject is a JSON
/// document encoded as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CredentialSubject {
    Object(Subject),
    Encoded(String),
}

impl CredentialSubject {
    pub fn decode(&self) -> RelayResult<Subject> {
        match self {
            CredentialSubject::Object(subject) => Ok(subject.clone()),
            CredentialSubject::Encoded(raw) => serde_json::from_str(raw).map_err(|e| {
                RelayError::Validation(format!("Invalid credentialSubject: {}", e))
            }),
        }
    }
}

/// The fields of a credential used for lookups
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRefs {
    pub issuer: String,
    pub credential_subject: CredentialSubject,
    #[serde(rename = "type", default)]
    pub types: Vec<String>,
}

impl CredentialRefs {
    pub fn from_value(credential: &Value) -> RelayResult<Self> {
        serde_json::from_value(credential.clone())
            .map_err(|e| RelayError::Validation(format!("Invalid credential: {}", e)))
    }

    pub fn subject_did(&self) -> RelayResult<String> {
        Ok(self.credential_subject.decode()?.id)
    }
}

/// Summary of a presentation for receipts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialInfo {
    pub subject_did: String,
    pub credential_types: Vec<String>,
}

/// Credentials carried by a presentation, tolerating a single object
pub fn credentials(presentation: &Value) -> Vec<Value> {
    match presentation.get("verifiableCredential") {
        Some(Value::Array(list)) => list.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(single) => vec![single.clone()],
    }
}

/// Subject DID and specific credential types of a presentation
///
/// The subject comes from the first credential; presentations without
/// credentials fall back to the `holder` DID.
pub fn extract_credential_info(presentation: &Value) -> RelayResult<CredentialInfo> {
    let mut subject_did = None;
    let mut credential_types: Vec<String> = Vec::new();

    for credential in credentials(presentation) {
        let refs = CredentialRefs::from_value(&credential)?;
        if subject_did.is_none() {
            subject_did = Some(refs.subject_did()?);
        }
        for kind in refs.types {
            if kind != BASE_CREDENTIAL_TYPE && !credential_types.contains(&kind) {
                credential_types.push(kind);
            }
        }
    }

    let subject_did = subject_did
        .or_else(|| {
            presentation
                .get("holder")
                .and_then(Value::as_str)
                .map(String::from)
        })
        .unwrap_or_default();

    Ok(CredentialInfo {
        subject_did,
        credential_types,
    })
}

use thiserror::Error;

use blossom_kv::KVError;

/// Errors raised by the policy engine.
///
/// `AccessDenied` and `NotFound` are never conflated: a missing node is
/// reported as missing even when the caller also lacks permission.
#[derive(Debug, Error)]
pub enum NgacError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate name: {0}")]
    DuplicateName(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    #[error("malformed obligation args: {0}")]
    MalformedObligationArgs(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("serialization: {0}")]
    Serialization(String),
}

impl From<KVError> for NgacError {
    fn from(e: KVError) -> Self {
        match e {
            KVError::Storage(m) => NgacError::Storage(m),
            KVError::Serialization(m) => NgacError::Serialization(m),
        }
    }
}

impl From<serde_json::Error> for NgacError {
    fn from(e: serde_json::Error) -> Self {
        NgacError::Serialization(e.to_string())
    }
}

impl From<NgacError> for blossom_core::ServiceError {
    fn from(e: NgacError) -> Self {
        use blossom_core::ServiceError;
        match e {
            NgacError::NotFound(m) => ServiceError::NotFound(m),
            NgacError::DuplicateName(m) => ServiceError::Conflict(m),
            NgacError::AccessDenied(m) => ServiceError::PermissionDenied(m),
            NgacError::InvalidGraph(m) => ServiceError::InvalidGraph(m),
            NgacError::MalformedObligationArgs(m) => ServiceError::MalformedObligation(m),
            NgacError::Validation(m) => ServiceError::Validation(m),
            NgacError::Storage(m) => ServiceError::Storage(m),
            NgacError::Serialization(m) => ServiceError::Internal(m),
        }
    }
}

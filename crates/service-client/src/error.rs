//! Service client errors

use thiserror::Error;

/// Errors that can occur when reading or writing Services in the cluster
#[derive(Debug, Error)]
pub enum ServiceClientError {
    /// Kubernetes API error that is not one of the kinds below
    #[error("Kubernetes error: {0}")]
    Kube(#[source] kube::Error),

    /// Service does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write rejected because the object changed underneath us (HTTP 409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// API server rejected the request for another reason
    #[error("API error: {0}")]
    Api(String),
}

impl ServiceClientError {
    /// Returns true when the error means the Service is absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<kube::Error> for ServiceClientError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(ref resp) if resp.code == 404 => Self::NotFound(resp.message.clone()),
            kube::Error::Api(ref resp) if resp.code == 409 => Self::Conflict(resp.message.clone()),
            other => Self::Kube(other),
        }
    }
}

//! Controller-specific error types.
//!
//! This module defines error types specific to the Metal3 provisioning
//! controller that are not covered by upstream library errors.

use crate::owner::OwnerReferenceError;
use service_client::ServiceClientError;
use thiserror::Error;

/// Errors that can occur in the provisioning controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error outside the Service store (client setup, parent lookup)
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Controller reference could not be set on the state Service
    #[error("unable to set controllerReference on service: {0}")]
    OwnerReference(#[source] OwnerReferenceError),

    /// Store rejected the create or update of the state Service
    #[error("unable to apply Metal3-state service: {0}")]
    Apply(#[source] ServiceClientError),

    /// Store rejected the delete for a reason other than absence
    #[error(transparent)]
    Delete(ServiceClientError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

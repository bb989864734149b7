//! ServiceClient trait for mocking
//!
//! This trait abstracts Service reads and writes so the reconciler can be
//! exercised in unit tests without an API server. The concrete
//! `ServiceClient` implements it over `kube::Api<Service>`, and tests use
//! `MockServiceClient`.

use crate::error::ServiceClientError;
use k8s_openapi::api::core::v1::Service;

/// Trait for Service store operations
///
/// All methods address a Service by its identity (namespace, name).
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ServiceClientTrait: Send + Sync {
    /// Fetch a Service. Absence is reported as `ServiceClientError::NotFound`.
    async fn get_service(&self, namespace: &str, name: &str) -> Result<Service, ServiceClientError>;

    /// Create a Service in the namespace named by its metadata.
    async fn create_service(&self, service: &Service) -> Result<Service, ServiceClientError>;

    /// Replace an existing Service. The `resourceVersion` carried in the
    /// metadata is used for optimistic concurrency.
    async fn replace_service(&self, service: &Service) -> Result<Service, ServiceClientError>;

    /// Delete a Service. Absence is reported as `ServiceClientError::NotFound`.
    async fn delete_service(&self, namespace: &str, name: &str) -> Result<(), ServiceClientError>;
}

//! Kubernetes-backed Service client
//!
//! Implements `ServiceClientTrait` on top of `kube::Api<Service>`.

use crate::error::ServiceClientError;
use crate::service_trait::ServiceClientTrait;
use k8s_openapi::api::core::v1::Service;
use kube::api::{DeleteParams, PostParams};
use kube::{Api, Client};
use tracing::debug;

/// Service client backed by the Kubernetes API
#[derive(Clone)]
pub struct ServiceClient {
    client: Client,
}

impl std::fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient").finish_non_exhaustive()
    }
}

impl ServiceClient {
    /// Create a new client from an existing Kubernetes client
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Service> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Namespace and name from a Service's metadata.
fn identity(service: &Service) -> Result<(&str, &str), ServiceClientError> {
    let namespace = service.metadata.namespace.as_deref().ok_or_else(|| {
        ServiceClientError::Api("Service metadata is missing a namespace".to_string())
    })?;
    let name = service.metadata.name.as_deref().ok_or_else(|| {
        ServiceClientError::Api("Service metadata is missing a name".to_string())
    })?;
    Ok((namespace, name))
}

#[async_trait::async_trait]
impl ServiceClientTrait for ServiceClient {
    async fn get_service(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Service, ServiceClientError> {
        debug!("Fetching Service {}/{}", namespace, name);
        Ok(self.api(namespace).get(name).await?)
    }

    async fn create_service(&self, service: &Service) -> Result<Service, ServiceClientError> {
        let (namespace, name) = identity(service)?;
        debug!("Creating Service {}/{}", namespace, name);
        Ok(self.api(namespace).create(&PostParams::default(), service).await?)
    }

    async fn replace_service(&self, service: &Service) -> Result<Service, ServiceClientError> {
        let (namespace, name) = identity(service)?;
        debug!("Replacing Service {}/{}", namespace, name);
        Ok(self
            .api(namespace)
            .replace(name, &PostParams::default(), service)
            .await?)
    }

    async fn delete_service(&self, namespace: &str, name: &str) -> Result<(), ServiceClientError> {
        debug!("Deleting Service {}/{}", namespace, name);
        self.api(namespace)
            .delete(name, &DeleteParams::default())
            .await?;
        Ok(())
    }
}

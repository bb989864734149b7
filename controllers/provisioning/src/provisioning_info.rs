//! Shared context handed to every reconcile operation.

use crate::events::EventPublisher;
use crate::state_service::StatePorts;
use crds::Provisioning;
use service_client::ServiceClientTrait;

/// Everything a reconcile step needs to know about the current deployment.
pub struct ProvisioningInfo {
    /// Namespace the Metal3 components run in
    pub namespace: String,
    /// Parent configuration resource; owner of everything created here
    pub prov_config: Provisioning,
    /// Validated port numbers exposed by the state Service
    pub ports: StatePorts,
    /// Service store
    pub client: Box<dyn ServiceClientTrait>,
    /// Kubernetes Event sink
    pub events: Box<dyn EventPublisher>,
}

impl std::fmt::Debug for ProvisioningInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisioningInfo")
            .field("namespace", &self.namespace)
            .field("prov_config", &self.prov_config.metadata.name)
            .field("ports", &self.ports)
            .finish_non_exhaustive()
    }
}

//! Test utilities for unit testing reconcilers
//!
//! This module provides helpers for creating test data and setting up test scenarios.

#[cfg(test)]
use crate::events::EventPublisher;
#[cfg(test)]
use crate::provisioning_info::ProvisioningInfo;
#[cfg(test)]
use crate::state_service::{BAREMETAL_HTTP_PORT, BAREMETAL_VMEDIA_HTTPS_PORT, StatePorts};
#[cfg(test)]
use crds::{Provisioning, ProvisioningSpec};
#[cfg(test)]
use k8s_openapi::api::core::v1::ObjectReference;
#[cfg(test)]
use kube::runtime::events::EventType;
#[cfg(test)]
use service_client::MockServiceClient;
#[cfg(test)]
use std::sync::{Arc, Mutex};

/// Namespace used by reconciler tests
#[cfg(test)]
pub const TEST_NAMESPACE: &str = "openshift-machine-api";

/// Ports parsed from the built-in defaults
#[cfg(test)]
pub fn test_ports() -> StatePorts {
    StatePorts::parse(BAREMETAL_HTTP_PORT, BAREMETAL_VMEDIA_HTTPS_PORT).unwrap()
}

/// Helper to create a persisted-looking Provisioning CR (name and uid set)
#[cfg(test)]
pub fn create_test_provisioning(disable_virtual_media_tls: bool) -> Provisioning {
    let mut prov = Provisioning::new(
        "provisioning-configuration",
        ProvisioningSpec {
            disable_virtual_media_tls,
            ..Default::default()
        },
    );
    prov.metadata.uid = Some("prov-uid".to_string());
    prov
}

/// Event captured by `RecordingEventPublisher`
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct RecordedEvent {
    pub object: Option<String>,
    pub warning: bool,
    pub reason: String,
    pub note: Option<String>,
}

/// EventPublisher that keeps every event in memory
#[cfg(test)]
#[derive(Clone, Default)]
pub struct RecordingEventPublisher {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

#[cfg(test)]
impl RecordingEventPublisher {
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn reasons(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.reason).collect()
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl EventPublisher for RecordingEventPublisher {
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        _action: &str,
        note: Option<String>,
    ) {
        self.events.lock().unwrap().push(RecordedEvent {
            object: resource_ref.name.clone(),
            warning: matches!(type_, EventType::Warning),
            reason: reason.to_string(),
            note,
        });
    }
}

/// Helper to build a ProvisioningInfo over the given mocks
#[cfg(test)]
pub fn create_test_info(
    client: &MockServiceClient,
    events: &RecordingEventPublisher,
    disable_virtual_media_tls: bool,
) -> ProvisioningInfo {
    ProvisioningInfo {
        namespace: TEST_NAMESPACE.to_string(),
        prov_config: create_test_provisioning(disable_virtual_media_tls),
        ports: test_ports(),
        client: Box::new(client.clone()),
        events: Box::new(events.clone()),
    }
}

//! Events recorded against the metal3-state Service when Ensure writes it.
//!
//! Recording is best effort. Ensure has already made its decision by the time
//! an event goes out, so a rejected event is only logged.

use k8s_openapi::api::core::v1::ObjectReference;
use kube::Client;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use tracing::warn;

/// Sink for the create/update outcome of the state Service.
#[async_trait::async_trait]
pub trait EventPublisher: Send + Sync {
    /// Record `reason` against the Service referenced by `resource_ref`.
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    );
}

/// Writes events.k8s.io Events through the API server.
pub struct KubeEventPublisher {
    recorder: Recorder,
}

impl std::fmt::Debug for KubeEventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeEventPublisher").finish_non_exhaustive()
    }
}

impl KubeEventPublisher {
    /// Events carry `controller_name` as the reporting controller and the
    /// pod name, when `POD_NAME` is set, as the reporting instance.
    pub fn new(client: Client, controller_name: &str) -> Self {
        let reporter = Reporter {
            controller: controller_name.to_string(),
            instance: std::env::var("POD_NAME").ok(),
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait::async_trait]
impl EventPublisher for KubeEventPublisher {
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        action: &str,
        note: Option<String>,
    ) {
        let event = Event {
            type_,
            reason: reason.to_string(),
            note,
            action: action.to_string(),
            secondary: None,
        };
        if let Err(e) = self.recorder.publish(&event, resource_ref).await {
            warn!(reason, action, error = %e, "Dropping state Service event");
        }
    }
}

/// Reasons recorded by the apply step.
pub mod reasons {
    /// No metal3-state Service existed, one was created
    pub const SERVICE_CREATED: &str = "ServiceCreated";
    /// Live Service differed in ports, selector, type or owners and was replaced
    pub const SERVICE_UPDATED: &str = "ServiceUpdated";
    /// Store refused the create
    pub const SERVICE_CREATE_FAILED: &str = "ServiceCreateFailed";
    /// Store refused the replace
    pub const SERVICE_UPDATE_FAILED: &str = "ServiceUpdateFailed";
}

/// The single action the reconciler performs on the Service.
pub mod actions {
    /// Create-or-replace of the state Service
    pub const APPLY: &str = "Apply";
}

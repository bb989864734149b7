//! Compare-and-update apply for Services.
//!
//! `apply_service` creates the Service when it is absent, and otherwise
//! writes only when `service_diff` reports a difference in one of the fields
//! this controller owns: ports, selector, type and owner references.
//! Everything else on the live object (clusterIP, resourceVersion, labels
//! added by other actors) is carried over untouched.

use crate::events::{EventPublisher, actions, reasons};
use crate::owner::merge_owner_references;
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::Resource;
use kube::runtime::events::EventType;
use service_client::{ServiceClientError, ServiceClientTrait};
use tracing::{debug, info, warn};

const DEFAULT_SERVICE_TYPE: &str = "ClusterIP";
const DEFAULT_PROTOCOL: &str = "TCP";

/// Service fields owned by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceField {
    /// `spec.ports`
    Ports,
    /// `spec.selector`
    Selector,
    /// `spec.type`
    Type,
    /// `metadata.ownerReferences`
    OwnerReferences,
}

impl ServiceField {
    /// Field path as written in the manifest
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ports => "spec.ports",
            Self::Selector => "spec.selector",
            Self::Type => "spec.type",
            Self::OwnerReferences => "metadata.ownerReferences",
        }
    }
}

/// A port with the API server's defaults filled in.
#[derive(Debug, PartialEq, Eq)]
struct NormalizedPort<'a> {
    name: Option<&'a str>,
    port: i32,
    protocol: &'a str,
    target_port: IntOrString,
    node_port: Option<i32>,
}

fn normalize_port(port: &ServicePort) -> NormalizedPort<'_> {
    NormalizedPort {
        name: port.name.as_deref(),
        port: port.port,
        protocol: port.protocol.as_deref().unwrap_or(DEFAULT_PROTOCOL),
        target_port: port.target_port.clone().unwrap_or(IntOrString::Int(port.port)),
        node_port: port.node_port,
    }
}

fn ports_match(existing: &ServiceSpec, required: &ServiceSpec) -> bool {
    let existing_ports = existing.ports.as_deref().unwrap_or_default();
    let required_ports = required.ports.as_deref().unwrap_or_default();
    existing_ports.len() == required_ports.len()
        && existing_ports
            .iter()
            .zip(required_ports)
            .all(|(e, r)| {
                let (e, r) = (normalize_port(e), normalize_port(r));
                // nodePort is only compared when the desired port pins one
                e.name == r.name
                    && e.port == r.port
                    && e.protocol == r.protocol
                    && e.target_port == r.target_port
                    && (r.node_port.is_none() || e.node_port == r.node_port)
            })
}

/// Lists the owned fields where `existing` differs from `required`.
///
/// Values the API server fills in on write (port protocol, targetPort,
/// service type) are compared with their defaults applied, so a freshly
/// created Service never differs from the object it was created from.
#[must_use]
pub fn service_diff(existing: &Service, required: &Service) -> Vec<ServiceField> {
    let empty = ServiceSpec::default();
    let existing_spec = existing.spec.as_ref().unwrap_or(&empty);
    let required_spec = required.spec.as_ref().unwrap_or(&empty);
    let mut changed = Vec::new();

    if !ports_match(existing_spec, required_spec) {
        changed.push(ServiceField::Ports);
    }

    if existing_spec.selector.clone().unwrap_or_default()
        != required_spec.selector.clone().unwrap_or_default()
    {
        changed.push(ServiceField::Selector);
    }

    let existing_type = existing_spec.type_.as_deref().unwrap_or(DEFAULT_SERVICE_TYPE);
    let required_type = required_spec.type_.as_deref().unwrap_or(DEFAULT_SERVICE_TYPE);
    if existing_type != required_type {
        changed.push(ServiceField::Type);
    }

    let existing_refs = existing.metadata.owner_references.as_deref().unwrap_or_default();
    let required_refs = required.metadata.owner_references.as_deref().unwrap_or_default();
    if !required_refs.iter().all(|r| existing_refs.contains(r)) {
        changed.push(ServiceField::OwnerReferences);
    }

    changed
}

/// Copies the owned fields of `required` onto a clone of `existing`.
#[must_use]
pub fn merge_service(existing: &Service, required: &Service) -> Service {
    let mut merged = existing.clone();

    if let Some(required_refs) = required.metadata.owner_references.as_deref() {
        let refs = merged.metadata.owner_references.get_or_insert_with(Vec::new);
        merge_owner_references(refs, required_refs);
    }

    let required_spec = required.spec.clone().unwrap_or_default();
    let spec = merged.spec.get_or_insert_with(ServiceSpec::default);
    spec.ports = required_spec.ports;
    spec.selector = required_spec.selector;
    spec.type_ = required_spec.type_;

    merged
}

fn describe(service: &Service) -> String {
    format!(
        "Service/{} -n {}",
        service.metadata.name.as_deref().unwrap_or_default(),
        service.metadata.namespace.as_deref().unwrap_or_default()
    )
}

/// Creates or updates `required` in the store.
///
/// Returns the stored object and whether a write happened. Emits a Normal
/// event for every write and a Warning event for every rejected write.
pub async fn apply_service(
    client: &dyn ServiceClientTrait,
    events: &dyn EventPublisher,
    required: &Service,
) -> Result<(Service, bool), ServiceClientError> {
    let namespace = required.metadata.namespace.as_deref().unwrap_or_default();
    let name = required.metadata.name.as_deref().unwrap_or_default();
    let object_ref = required.object_ref(&());

    let existing = match client.get_service(namespace, name).await {
        Ok(existing) => existing,
        Err(e) if e.is_not_found() => {
            return match client.create_service(required).await {
                Ok(created) => {
                    info!("Created {}", describe(required));
                    events
                        .publish(
                            &object_ref,
                            EventType::Normal,
                            reasons::SERVICE_CREATED,
                            actions::APPLY,
                            Some(format!("Created {} because it was missing", describe(required))),
                        )
                        .await;
                    Ok((created, true))
                }
                Err(e) => {
                    warn!("Failed to create {}: {}", describe(required), e);
                    events
                        .publish(
                            &object_ref,
                            EventType::Warning,
                            reasons::SERVICE_CREATE_FAILED,
                            actions::APPLY,
                            Some(format!("Failed to create {}: {}", describe(required), e)),
                        )
                        .await;
                    Err(e)
                }
            };
        }
        Err(e) => return Err(e),
    };

    let changed = service_diff(&existing, required);
    if changed.is_empty() {
        debug!("{} is up to date", describe(required));
        return Ok((existing, false));
    }

    let fields = changed
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    info!("{} changed ({}), updating", describe(required), fields);

    match client.replace_service(&merge_service(&existing, required)).await {
        Ok(updated) => {
            events
                .publish(
                    &object_ref,
                    EventType::Normal,
                    reasons::SERVICE_UPDATED,
                    actions::APPLY,
                    Some(format!("Updated {} because it changed: {}", describe(required), fields)),
                )
                .await;
            Ok((updated, true))
        }
        Err(e) => {
            warn!("Failed to update {}: {}", describe(required), e);
            events
                .publish(
                    &object_ref,
                    EventType::Warning,
                    reasons::SERVICE_UPDATE_FAILED,
                    actions::APPLY,
                    Some(format!("Failed to update {}: {}", describe(required), e)),
                )
                .await;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_service::new_state_service;
    use crate::test_utils::test_ports;

    fn desired() -> Service {
        new_state_service("openshift-machine-api", false, test_ports())
    }

    #[test]
    fn test_identical_services_do_not_differ() {
        assert!(service_diff(&desired(), &desired()).is_empty());
    }

    #[test]
    fn test_server_defaults_do_not_differ() {
        let mut live = desired();
        let spec = live.spec.as_mut().unwrap();
        spec.cluster_ip = Some("172.30.12.4".to_string());
        for port in spec.ports.as_mut().unwrap() {
            port.protocol = Some("TCP".to_string());
            port.target_port = Some(IntOrString::Int(port.port));
        }
        live.metadata.resource_version = Some("42".to_string());

        assert!(service_diff(&live, &desired()).is_empty());
    }

    #[test]
    fn test_port_order_matters() {
        let mut live = desired();
        live.spec.as_mut().unwrap().ports.as_mut().unwrap().reverse();

        assert_eq!(service_diff(&live, &desired()), vec![ServiceField::Ports]);
    }

    #[test]
    fn test_extra_port_differs() {
        let live = desired();
        let required = new_state_service("openshift-machine-api", true, test_ports());

        assert_eq!(service_diff(&live, &required), vec![ServiceField::Ports]);
    }

    #[test]
    fn test_named_target_port_differs() {
        let mut live = desired();
        live.spec.as_mut().unwrap().ports.as_mut().unwrap()[0].target_port =
            Some(IntOrString::String("httpd".to_string()));

        assert_eq!(service_diff(&live, &desired()), vec![ServiceField::Ports]);
    }

    #[test]
    fn test_selector_and_type_differ() {
        let mut live = desired();
        let spec = live.spec.as_mut().unwrap();
        spec.selector = None;
        spec.type_ = Some("LoadBalancer".to_string());

        assert_eq!(
            service_diff(&live, &desired()),
            vec![ServiceField::Selector, ServiceField::Type]
        );
    }

    #[test]
    fn test_unset_type_counts_as_cluster_ip() {
        let mut live = desired();
        live.spec.as_mut().unwrap().type_ = None;

        assert!(service_diff(&live, &desired()).is_empty());
    }

    #[test]
    fn test_missing_owner_reference_differs() {
        let live = desired();
        let mut required = desired();
        crate::owner::set_controller_reference(
            &crate::test_utils::create_test_provisioning(false),
            &mut required.metadata,
        )
        .unwrap();

        assert_eq!(service_diff(&live, &required), vec![ServiceField::OwnerReferences]);
        assert!(service_diff(&required, &live).is_empty());
    }

    #[test]
    fn test_merge_keeps_server_fields() {
        let mut live = desired();
        live.metadata.resource_version = Some("7".to_string());
        live.metadata.labels = Some([("team".to_string(), "metal3".to_string())].into());
        live.spec.as_mut().unwrap().cluster_ip = Some("172.30.12.4".to_string());
        let required = new_state_service("openshift-machine-api", true, test_ports());

        let merged = merge_service(&live, &required);

        assert_eq!(merged.metadata.resource_version.as_deref(), Some("7"));
        assert!(merged.metadata.labels.is_some());
        let spec = merged.spec.as_ref().unwrap();
        assert_eq!(spec.cluster_ip.as_deref(), Some("172.30.12.4"));
        assert_eq!(spec.ports.as_ref().unwrap().len(), 1);
        assert!(service_diff(&merged, &required).is_empty());
    }
}

//! The `metal3-state` Service.
//!
//! A ClusterIP Service in front of the Metal3 pod exposing the HTTP port and,
//! unless virtual-media TLS is disabled, the virtual-media HTTPS port.
//! `ensure_state_service` keeps it in the desired shape and
//! `delete_state_service` removes it.

use crate::apply::apply_service;
use crate::error::ControllerError;
use crate::owner::set_controller_reference;
use crate::provisioning_info::ProvisioningInfo;
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Name of the state Service
pub const STATE_SERVICE: &str = "metal3-state";
/// Label carried by the Metal3 pod and used as the Service selector
pub const CBO_LABEL_NAME: &str = "baremetal.openshift.io/cluster-baremetal-operator";
/// Name of the HTTP port
pub const HTTP_PORT_NAME: &str = "http";
/// Name of the virtual-media HTTPS port
pub const VMEDIA_HTTPS_PORT_NAME: &str = "vmedia-https";
/// Default HTTP port served by the Metal3 httpd container
pub const BAREMETAL_HTTP_PORT: &str = "6180";
/// Default virtual-media HTTPS port served by the Metal3 httpd container
pub const BAREMETAL_VMEDIA_HTTPS_PORT: &str = "6183";

/// Port numbers exposed by the state Service, validated once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatePorts {
    /// HTTP port
    pub http: i32,
    /// Virtual-media HTTPS port
    pub vmedia_https: i32,
}

impl StatePorts {
    /// Parses both ports, rejecting anything outside 1-65535 and a shared
    /// port number.
    pub fn parse(http: &str, vmedia_https: &str) -> Result<Self, ControllerError> {
        let http = parse_port(HTTP_PORT_NAME, http)?;
        let vmedia_https = parse_port(VMEDIA_HTTPS_PORT_NAME, vmedia_https)?;
        if http == vmedia_https {
            return Err(ControllerError::InvalidConfig(format!(
                "{HTTP_PORT_NAME} and {VMEDIA_HTTPS_PORT_NAME} ports must differ, both are {http}"
            )));
        }
        Ok(Self { http, vmedia_https })
    }
}

fn parse_port(name: &str, value: &str) -> Result<i32, ControllerError> {
    match value.trim().parse::<u16>() {
        Ok(port) if port != 0 => Ok(i32::from(port)),
        _ => Err(ControllerError::InvalidConfig(format!(
            "{name} port must be a number between 1 and 65535, got {value:?}"
        ))),
    }
}

/// Builds the desired state Service. Pure: equal inputs give equal output.
#[must_use]
pub fn new_state_service(
    target_namespace: &str,
    disable_virtual_media_tls: bool,
    ports: StatePorts,
) -> Service {
    let mut service_ports = vec![ServicePort {
        name: Some(HTTP_PORT_NAME.to_string()),
        port: ports.http,
        ..Default::default()
    }];
    if !disable_virtual_media_tls {
        service_ports.push(ServicePort {
            name: Some(VMEDIA_HTTPS_PORT_NAME.to_string()),
            port: ports.vmedia_https,
            ..Default::default()
        });
    }

    Service {
        metadata: ObjectMeta {
            name: Some(STATE_SERVICE.to_string()),
            namespace: Some(target_namespace.to_string()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("ClusterIP".to_string()),
            selector: Some(BTreeMap::from([(
                CBO_LABEL_NAME.to_string(),
                STATE_SERVICE.to_string(),
            )])),
            ports: Some(service_ports),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Creates or updates the state Service. Returns whether anything was written.
pub async fn ensure_state_service(info: &ProvisioningInfo) -> Result<bool, ControllerError> {
    let mut service = new_state_service(
        &info.namespace,
        info.prov_config.spec.disable_virtual_media_tls,
        info.ports,
    );

    set_controller_reference(&info.prov_config, &mut service.metadata)
        .map_err(ControllerError::OwnerReference)?;

    let (_, updated) = apply_service(info.client.as_ref(), info.events.as_ref(), &service)
        .await
        .map_err(ControllerError::Apply)?;

    if updated {
        info!("Applied {}/{}", info.namespace, STATE_SERVICE);
    }
    Ok(updated)
}

/// Deletes the state Service. An already absent Service is not an error.
pub async fn delete_state_service(info: &ProvisioningInfo) -> Result<(), ControllerError> {
    match info.client.delete_service(&info.namespace, STATE_SERVICE).await {
        Ok(()) => {
            info!("Deleted {}/{}", info.namespace, STATE_SERVICE);
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            debug!("{}/{} already absent", info.namespace, STATE_SERVICE);
            Ok(())
        }
        Err(e) => Err(ControllerError::Delete(e)),
    }
}

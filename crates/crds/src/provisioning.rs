//! Provisioning CRD
//!
//! Cluster-wide configuration for the Metal3 baremetal provisioning stack.
//! The controller owns the resources it creates for Metal3 (such as the
//! `metal3-state` Service) through a controller reference to this object.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Name of the single `Provisioning` resource the operator acts on
pub const PROVISIONING_SINGLETON_NAME: &str = "provisioning-configuration";

/// Provisioning configuration spec
#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[kube(
    group = "metal3.io",
    version = "v1alpha1",
    kind = "Provisioning",
    plural = "provisionings"
)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningSpec {
    /// Network used to PXE boot hosts
    #[serde(default)]
    pub provisioning_network: ProvisioningNetwork,

    /// Interface on the control plane nodes attached to the provisioning network
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_interface: Option<String>,

    /// Serve virtual media over plain HTTP only.
    /// When false the Metal3 state endpoint also exposes the virtual-media HTTPS port.
    #[serde(default, rename = "disableVirtualMediaTLS")]
    pub disable_virtual_media_tls: bool,

    /// Reconcile BareMetalHosts in every namespace instead of the target namespace only
    #[serde(default)]
    pub watch_all_namespaces: bool,
}

/// How hosts reach the provisioning services
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
pub enum ProvisioningNetwork {
    /// Provisioning network with DHCP served by Metal3
    #[default]
    Managed,

    /// Provisioning network with an external DHCP server
    Unmanaged,

    /// No provisioning network, virtual media only
    Disabled,
}

//! Controller configuration from environment variables.

use crate::error::ControllerError;
use crate::state_service::{BAREMETAL_HTTP_PORT, BAREMETAL_VMEDIA_HTTPS_PORT, StatePorts};
use crds::PROVISIONING_SINGLETON_NAME;
use std::str::FromStr;

/// Namespace the Metal3 components are deployed to by default
pub const DEFAULT_TARGET_NAMESPACE: &str = "openshift-machine-api";

/// What a run of the controller does to the state Service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateServiceAction {
    /// Create or update the Service
    #[default]
    Ensure,
    /// Remove the Service
    Delete,
}

impl FromStr for StateServiceAction {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ensure" => Ok(Self::Ensure),
            "delete" => Ok(Self::Delete),
            other => Err(ControllerError::InvalidConfig(format!(
                "STATE_SERVICE_ACTION must be \"ensure\" or \"delete\", got {other:?}"
            ))),
        }
    }
}

/// Validated controller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Namespace holding the state Service
    pub target_namespace: String,
    /// Name of the `Provisioning` resource owning the Service
    pub provisioning_name: String,
    /// Ports exposed by the state Service
    pub ports: StatePorts,
    /// Operation to run
    pub action: StateServiceAction,
}

impl ControllerConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which returns a variable's value if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let target_namespace = lookup("TARGET_NAMESPACE")
            .unwrap_or_else(|| DEFAULT_TARGET_NAMESPACE.to_string());
        if target_namespace.trim().is_empty() {
            return Err(ControllerError::InvalidConfig(
                "TARGET_NAMESPACE must not be empty".to_string(),
            ));
        }

        let provisioning_name = lookup("PROVISIONING_NAME")
            .unwrap_or_else(|| PROVISIONING_SINGLETON_NAME.to_string());

        let ports = StatePorts::parse(
            &lookup("METAL3_HTTP_PORT").unwrap_or_else(|| BAREMETAL_HTTP_PORT.to_string()),
            &lookup("METAL3_VMEDIA_HTTPS_PORT")
                .unwrap_or_else(|| BAREMETAL_VMEDIA_HTTPS_PORT.to_string()),
        )?;

        let action = lookup("STATE_SERVICE_ACTION")
            .map(|v| v.parse::<StateServiceAction>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            target_namespace,
            provisioning_name,
            ports,
            action,
        })
    }
}

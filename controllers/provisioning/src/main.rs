//! Metal3 Provisioning Controller
//!
//! Keeps the `metal3-state` Service in front of the Metal3 pod in line with
//! the cluster's `Provisioning` configuration.
//!
//! Each run performs a single pass: with `STATE_SERVICE_ACTION=ensure` (the
//! default) the Service is created or updated, with `delete` it is removed.
//! Scheduling and retries belong to whatever invokes the binary.

mod apply;
mod config;
mod error;
mod events;
mod owner;
mod provisioning_info;
mod state_service;
#[cfg(test)]
mod test_utils;

use crate::config::{ControllerConfig, StateServiceAction};
use crate::error::ControllerError;
use crate::events::KubeEventPublisher;
use crate::provisioning_info::ProvisioningInfo;
use crate::state_service::{STATE_SERVICE, delete_state_service, ensure_state_service};
use crds::{Provisioning, ProvisioningSpec};
use kube::{Api, Client};
use service_client::ServiceClient;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Reporting component name on published Events
const CONTROLLER_NAME: &str = "metal3-provisioning-controller";

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // kube is built with rustls; pick ring as the process-wide crypto provider
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("rustls crypto provider was already installed");
    }

    info!("Starting Metal3 Provisioning Controller");

    let config = ControllerConfig::from_env()?;
    info!("Configuration:");
    info!("  Target namespace: {}", config.target_namespace);
    info!("  Provisioning: {}", config.provisioning_name);
    info!("  Ports: http={} vmedia-https={}", config.ports.http, config.ports.vmedia_https);
    info!("  Action: {:?}", config.action);

    let kube_client = Client::try_default().await?;

    let provisionings: Api<Provisioning> = Api::all(kube_client.clone());
    let existing = provisionings.get_opt(&config.provisioning_name).await?;
    let prov_config = match (existing, config.action) {
        (Some(prov), _) => prov,
        (None, StateServiceAction::Delete) => {
            // The parent is only needed for ownership, which delete never touches
            info!("Provisioning {} is gone, deleting by name only", config.provisioning_name);
            Provisioning::new(&config.provisioning_name, ProvisioningSpec::default())
        }
        (None, StateServiceAction::Ensure) => {
            return Err(ControllerError::InvalidConfig(format!(
                "Provisioning {} not found",
                config.provisioning_name
            )));
        }
    };

    let info = ProvisioningInfo {
        namespace: config.target_namespace,
        prov_config,
        ports: config.ports,
        client: Box::new(ServiceClient::new(kube_client.clone())),
        events: Box::new(KubeEventPublisher::new(kube_client, CONTROLLER_NAME)),
    };

    match config.action {
        StateServiceAction::Ensure => {
            let updated = ensure_state_service(&info).await?;
            info!(updated, "Reconciled {}/{}", info.namespace, STATE_SERVICE);
        }
        StateServiceAction::Delete => {
            delete_state_service(&info).await?;
            info!("Removed {}/{}", info.namespace, STATE_SERVICE);
        }
    }

    Ok(())
}

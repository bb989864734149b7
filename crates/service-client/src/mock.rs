//! Mock ServiceClient for unit testing
//!
//! In-memory implementation of `ServiceClientTrait` that behaves like a small
//! API server: it assigns `uid`, `resourceVersion` and `clusterIP` on create,
//! defaults port `protocol`/`targetPort`, enforces `resourceVersion` on
//! replace, and reports absent objects as `NotFound`. Failures can be
//! injected per operation to exercise error paths.

use crate::error::ServiceClientError;
use crate::service_trait::ServiceClientTrait;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type ServiceKey = (String, String);

/// Mock ServiceClient for testing
///
/// Clones share the same backing store, so a test can keep a handle for
/// assertions after handing the client to the reconciler.
#[derive(Clone, Debug, Default)]
pub struct MockServiceClient {
    pub(crate) services: Arc<Mutex<HashMap<ServiceKey, Service>>>,
    pub(crate) next_version: Arc<Mutex<u64>>,
    pub(crate) calls: Arc<Mutex<CallCounts>>,
    pub(crate) failures: Arc<Mutex<InjectedFailures>>,
}

/// Number of calls received per operation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `get_service` calls
    pub get: usize,
    /// `create_service` calls
    pub create: usize,
    /// `replace_service` calls
    pub replace: usize,
    /// `delete_service` calls
    pub delete: usize,
}

/// Messages returned as `ServiceClientError::Api` on the next call of each operation
#[derive(Clone, Debug, Default)]
pub(crate) struct InjectedFailures {
    get: Option<String>,
    create: Option<String>,
    replace: Option<String>,
    delete: Option<String>,
}

impl MockServiceClient {
    /// Create an empty mock store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a Service directly (for test setup), bypassing defaulting
    pub fn add_service(&self, service: Service) {
        let key = key_of(&service);
        self.services.lock().unwrap().insert(key, service);
    }

    /// Current stored copy of a Service
    #[must_use]
    pub fn service(&self, namespace: &str, name: &str) -> Option<Service> {
        self.services
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Number of Services in the store
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.lock().unwrap().len()
    }

    /// Whether the store holds no Services
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls received so far
    #[must_use]
    pub fn calls(&self) -> CallCounts {
        *self.calls.lock().unwrap()
    }

    /// Fail the next `get_service` call with an API error
    pub fn fail_next_get(&self, message: impl Into<String>) {
        self.failures.lock().unwrap().get = Some(message.into());
    }

    /// Fail the next `create_service` call with an API error
    pub fn fail_next_create(&self, message: impl Into<String>) {
        self.failures.lock().unwrap().create = Some(message.into());
    }

    /// Fail the next `replace_service` call with an API error
    pub fn fail_next_replace(&self, message: impl Into<String>) {
        self.failures.lock().unwrap().replace = Some(message.into());
    }

    /// Fail the next `delete_service` call with an API error
    pub fn fail_next_delete(&self, message: impl Into<String>) {
        self.failures.lock().unwrap().delete = Some(message.into());
    }

    fn bump_version(&self) -> String {
        let mut version = self.next_version.lock().unwrap();
        *version += 1;
        version.to_string()
    }
}

fn key_of(service: &Service) -> ServiceKey {
    (
        service.metadata.namespace.clone().unwrap_or_default(),
        service.metadata.name.clone().unwrap_or_default(),
    )
}

fn take_failure(slot: &mut Option<String>) -> Result<(), ServiceClientError> {
    match slot.take() {
        Some(message) => Err(ServiceClientError::Api(message)),
        None => Ok(()),
    }
}

/// Fill in the fields the API server defaults on Service ports.
fn default_ports(service: &mut Service) {
    let Some(ports) = service.spec.as_mut().and_then(|spec| spec.ports.as_mut()) else {
        return;
    };
    for port in ports {
        if port.protocol.is_none() {
            port.protocol = Some("TCP".to_string());
        }
        if port.target_port.is_none() {
            port.target_port = Some(IntOrString::Int(port.port));
        }
    }
}

#[async_trait::async_trait]
impl ServiceClientTrait for MockServiceClient {
    async fn get_service(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Service, ServiceClientError> {
        self.calls.lock().unwrap().get += 1;
        take_failure(&mut self.failures.lock().unwrap().get)?;
        self.service(namespace, name)
            .ok_or_else(|| ServiceClientError::NotFound(format!("services \"{name}\" not found")))
    }

    async fn create_service(&self, service: &Service) -> Result<Service, ServiceClientError> {
        self.calls.lock().unwrap().create += 1;
        take_failure(&mut self.failures.lock().unwrap().create)?;

        let key = key_of(service);
        if self.services.lock().unwrap().contains_key(&key) {
            return Err(ServiceClientError::Conflict(format!(
                "services \"{}\" already exists",
                key.1
            )));
        }

        let mut created = service.clone();
        created.metadata.uid = Some(format!("uid-{}-{}", key.0, key.1));
        created.metadata.resource_version = Some(self.bump_version());
        if let Some(spec) = created.spec.as_mut() {
            spec.cluster_ip.get_or_insert_with(|| "172.30.0.10".to_string());
        }
        default_ports(&mut created);

        self.services.lock().unwrap().insert(key, created.clone());
        Ok(created)
    }

    async fn replace_service(&self, service: &Service) -> Result<Service, ServiceClientError> {
        self.calls.lock().unwrap().replace += 1;
        take_failure(&mut self.failures.lock().unwrap().replace)?;

        let key = key_of(service);
        let mut services = self.services.lock().unwrap();
        let Some(existing) = services.get(&key) else {
            return Err(ServiceClientError::NotFound(format!(
                "services \"{}\" not found",
                key.1
            )));
        };
        if existing.metadata.resource_version != service.metadata.resource_version {
            return Err(ServiceClientError::Conflict(format!(
                "the object has been modified; please apply your changes to the latest \
                 version of services \"{}\"",
                key.1
            )));
        }

        let mut replaced = service.clone();
        replaced.metadata.uid.clone_from(&existing.metadata.uid);
        replaced.metadata.resource_version = Some(self.bump_version());
        default_ports(&mut replaced);

        services.insert(key, replaced.clone());
        Ok(replaced)
    }

    async fn delete_service(&self, namespace: &str, name: &str) -> Result<(), ServiceClientError> {
        self.calls.lock().unwrap().delete += 1;
        take_failure(&mut self.failures.lock().unwrap().delete)?;
        self.services
            .lock()
            .unwrap()
            .remove(&(namespace.to_string(), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| ServiceClientError::NotFound(format!("services \"{name}\" not found")))
    }
}

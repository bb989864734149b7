//! Metal3 CRD Definitions
//!
//! Kubernetes Custom Resource Definitions consumed by the Metal3 provisioning
//! controller.

pub mod provisioning;

pub use provisioning::*;

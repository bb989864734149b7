//! Service Store Client
//!
//! Narrow client for the one object kind the Metal3 provisioning controller
//! reconciles here: core/v1 `Service`. Reads and writes go through
//! `ServiceClientTrait` so reconcilers can run against the in-memory
//! `MockServiceClient` (feature `test-util`) in unit tests.
//!
//! # Example
//!
//! ```no_run
//! use service_client::{ServiceClient, ServiceClientTrait};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ServiceClient::new(kube::Client::try_default().await?);
//!
//! match client.get_service("openshift-machine-api", "metal3-state").await {
//!     Ok(svc) => println!("found {:?}", svc.metadata.name),
//!     Err(e) if e.is_not_found() => println!("absent"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod service_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::ServiceClient;
pub use error::ServiceClientError;
pub use service_trait::ServiceClientTrait;
#[cfg(feature = "test-util")]
pub use mock::{CallCounts, MockServiceClient};

//! Juju client
//!
//! A thin wrapper that runs the `juju` binary against one environment. The
//! assessment only sees it through [`ClusterClient`].

mod client;
pub mod environment;
pub mod status;
pub mod version;

use async_trait::async_trait;

use crate::common::Result;

pub use client::JujuClient;
pub use environment::{Environment, TempEnvironment};
pub use status::{AgentProgress, Status};
pub use version::{Dialect, JujuVersion};

/// The capabilities a scenario needs from a bootstrapped environment
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Deploy a charm by reference, e.g. `local:trusty/my-charm`
    async fn deploy(&self, charm: &str) -> Result<()>;

    /// Block until every machine and unit agent has started
    ///
    /// Polling and timeout are the client's business.
    async fn wait_for_started(&self) -> Result<()>;
}

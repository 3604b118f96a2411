//! Juju multi-series charm assessment
//!
//! Bootstraps a temporary Juju environment, deploys a local charm into it and
//! waits for the deployment to start, tearing the environment down afterwards.

pub mod assess;
pub mod bootstrap;
pub mod charm;
pub mod cli;
pub mod common;
pub mod juju;

// Re-export commonly used types for tests
pub use common::{Error, Result};

//! Arguments shared by every scenario that bootstraps a temporary environment

use clap::Args;
use std::path::PathBuf;

use crate::common::logging::LoggingConfig;
use crate::juju::TempEnvironment;

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct TestingArgs {
    /// The juju environment to base the temporary test environment on
    pub env: String,

    /// Full path to the juju binary
    pub juju_bin: PathBuf,

    /// A directory in which to store logs
    pub logs: PathBuf,

    /// A temporary test environment name
    pub temp_env_name: String,

    /// Pass --debug to juju
    #[arg(long)]
    pub debug: bool,

    /// Verbose test harness output
    #[arg(long, short)]
    pub verbose: bool,

    /// Override environment region
    #[arg(long)]
    pub region: Option<String>,

    /// Override the default series
    #[arg(long)]
    pub series: Option<String>,

    /// URL for retrieving agent binaries
    #[arg(long)]
    pub agent_url: Option<String>,

    /// Stream for retrieving agent binaries
    #[arg(long)]
    pub agent_stream: Option<String>,

    /// The host to use for bootstrap (manual provider)
    #[arg(long)]
    pub bootstrap_host: Option<String>,

    /// A machine to add to the environment after bootstrap; may be repeated
    #[arg(long)]
    pub machine: Vec<String>,

    /// Keep the environment after the test completes
    #[arg(long)]
    pub keep_env: bool,

    /// Upload local agent binaries before bootstrapping
    #[arg(long)]
    pub upload_tools: bool,
}

impl TestingArgs {
    /// Overrides that turn the base profile into the run's environment
    pub fn temp_environment(&self) -> TempEnvironment {
        TempEnvironment {
            name: self.temp_env_name.clone(),
            region: self.region.clone(),
            series: self.series.clone(),
            agent_url: self.agent_url.clone(),
            agent_stream: self.agent_stream.clone(),
            bootstrap_host: self.bootstrap_host.clone(),
        }
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::for_run(self.verbose, Some(self.logs.clone()))
    }
}

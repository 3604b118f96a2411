//! Command-line entry point
//!
//! `run` is the whole scenario: configure logging, load the environment
//! profile, build a client, and assess inside a booted environment. Every
//! step goes through [`Harness`] so the composition can be exercised without
//! a real juju.

use clap::Parser;
use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use std::ffi::OsString;
use std::path::Path;

use crate::assess::assess_multi_series_charms;
use crate::bootstrap::{BootstrapClient, BootstrapManager, TestingArgs};
use crate::common::config::Config;
use crate::common::logging::{self, LoggingConfig};
use crate::common::Result;
use crate::juju::{ClusterClient, Environment, JujuClient};

/// Name the binary reports in usage output
pub const BIN_NAME: &str = "assess-multi-series-charms";

#[derive(Parser)]
#[command(
    name = BIN_NAME,
    about = "Deploy a multi-series charm into a temporary Juju environment and wait for it to start"
)]
#[command(version, long_about = None)]
struct Cli {
    #[command(flatten)]
    args: TestingArgs,
}

/// Parse arguments, excluding the program name
///
/// `--help`, `--version` and malformed invocations come back as
/// [`Error::Usage`](crate::common::Error::Usage); `clap::Error::exit` prints
/// them to the right stream with the right status.
pub fn parse_args<I, T>(argv: I) -> Result<TestingArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let argv = std::iter::once(OsString::from(BIN_NAME)).chain(argv.into_iter().map(Into::into));
    Ok(Cli::try_parse_from(argv)?.args)
}

/// Work run inside the booted context
pub type Action<'a, C> = Box<dyn FnOnce(&'a C) -> LocalBoxFuture<'a, Result<()>> + 'a>;

/// The collaborators `run` composes
pub trait Harness {
    type Client: ClusterClient + BootstrapClient;

    fn configure_logging(&self, config: &LoggingConfig);

    fn environment_from_config(&self, name: &str) -> Result<Environment>;

    fn client_by_version<'a>(
        &'a self,
        env: Environment,
        juju_bin: &'a Path,
        debug: bool,
    ) -> LocalBoxFuture<'a, Result<Self::Client>>;

    fn booted_context<'a>(
        &'a self,
        manager: &'a BootstrapManager,
        client: &'a mut Self::Client,
        action: Action<'a, Self::Client>,
    ) -> LocalBoxFuture<'a, Result<()>>;

    fn assess<'a>(&'a self, client: &'a Self::Client) -> LocalBoxFuture<'a, Result<()>>;
}

/// Production collaborators backed by the juju binary
pub struct JujuHarness {
    config: Config,
}

impl JujuHarness {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl Harness for JujuHarness {
    type Client = JujuClient;

    fn configure_logging(&self, config: &LoggingConfig) {
        if let Some(path) = logging::init(config) {
            tracing::debug!(log_file = %path.display(), "Writing harness log");
        }
    }

    fn environment_from_config(&self, name: &str) -> Result<Environment> {
        Environment::from_config(name)
    }

    fn client_by_version<'a>(
        &'a self,
        env: Environment,
        juju_bin: &'a Path,
        debug: bool,
    ) -> LocalBoxFuture<'a, Result<JujuClient>> {
        JujuClient::by_version(env, juju_bin, debug, self.config.clone()).boxed_local()
    }

    fn booted_context<'a>(
        &'a self,
        manager: &'a BootstrapManager,
        client: &'a mut JujuClient,
        action: Action<'a, JujuClient>,
    ) -> LocalBoxFuture<'a, Result<()>> {
        manager.booted_context(client, action).boxed_local()
    }

    fn assess<'a>(&'a self, client: &'a JujuClient) -> LocalBoxFuture<'a, Result<()>> {
        assess_multi_series_charms(client).boxed_local()
    }
}

/// Run the scenario with already parsed arguments
pub async fn run<H: Harness>(args: TestingArgs, harness: &H) -> Result<()> {
    harness.configure_logging(&args.logging_config());
    tracing::debug!(?args, "Starting multi-series charm assessment");

    let env = harness.environment_from_config(&args.env)?;
    let mut client = harness
        .client_by_version(env, &args.juju_bin, args.debug)
        .await?;

    let manager = BootstrapManager::from_args(&args);
    harness
        .booted_context(&manager, &mut client, Box::new(move |client| harness.assess(client)))
        .await
}

/// Parse `argv` and run against the real juju
pub async fn main<I, T>(argv: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args = parse_args(argv)?;
    let config = Config::load()?;
    run(args, &JujuHarness::new(config)).await
}

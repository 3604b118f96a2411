//! Bootstrapped environment lifecycle
//!
//! [`BootstrapManager::booted_context`] owns a temporary environment for the
//! duration of one action: it isolates the client in a throwaway Juju home,
//! bootstraps, runs the action, then collects logs and tears the environment
//! down whether the action returned, failed or panicked. SIGINT and SIGTERM
//! interrupt bootstrap or the action and go through the same cleanup.

pub mod args;

use async_trait::async_trait;
use futures_util::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};
use crate::juju::TempEnvironment;

pub use args::TestingArgs;

/// Options for `juju bootstrap`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapOptions {
    pub upload_tools: bool,
    pub bootstrap_series: Option<String>,
}

/// Lifecycle operations the booted context drives on a client
#[async_trait]
pub trait BootstrapClient: Send + Sync {
    fn environment_name(&self) -> &str;

    /// Re-target the client at `temp` inside the isolated `juju_home`
    fn isolate(&mut self, temp: &TempEnvironment, juju_home: &Path) -> Result<()>;

    async fn bootstrap(&self, options: &BootstrapOptions) -> Result<()>;

    async fn add_ssh_machines(&self, machines: &[String]) -> Result<()>;

    /// Copy status and logs of the environment into `log_dir`
    async fn dump_logs(&self, log_dir: &Path) -> Result<()>;

    async fn tear_down(&self) -> Result<()>;
}

/// Settings for one bootstrapped environment
#[derive(Debug, Clone)]
pub struct BootstrapManager {
    temp_env: TempEnvironment,
    log_dir: PathBuf,
    keep_env: bool,
    upload_tools: bool,
    machines: Vec<String>,
}

impl BootstrapManager {
    pub fn from_args(args: &TestingArgs) -> Self {
        Self {
            temp_env: args.temp_environment(),
            log_dir: args.logs.clone(),
            keep_env: args.keep_env,
            upload_tools: args.upload_tools,
            machines: args.machine.clone(),
        }
    }

    pub fn temp_env(&self) -> &TempEnvironment {
        &self.temp_env
    }

    fn options(&self) -> BootstrapOptions {
        BootstrapOptions {
            upload_tools: self.upload_tools,
            bootstrap_series: self.temp_env.series.clone(),
        }
    }

    /// Bootstrap, run `action` against the live client, always clean up
    ///
    /// The action's error wins over a teardown error; a panic in the action is
    /// resumed once cleanup has run. A termination signal stops bootstrap or
    /// the action with [`Error::Interrupted`].
    pub async fn booted_context<'a, C, F, Fut>(&self, client: &'a mut C, action: F) -> Result<()>
    where
        C: BootstrapClient,
        F: FnOnce(&'a C) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        self.booted_context_until(client, action, shutdown_signal()).await
    }

    /// [`booted_context`](Self::booted_context) stopped by `interrupt` instead
    /// of process signals
    pub async fn booted_context_until<'a, C, F, Fut, I>(
        &self,
        client: &'a mut C,
        action: F,
        interrupt: I,
    ) -> Result<()>
    where
        C: BootstrapClient,
        F: FnOnce(&'a C) -> Fut,
        Fut: Future<Output = Result<()>>,
        I: Future<Output = ()>,
    {
        let juju_home = tempfile::Builder::new().prefix("juju-home-").tempdir()?;
        client.isolate(&self.temp_env, juju_home.path())?;
        let client: &'a C = client;
        tokio::pin!(interrupt);

        tracing::info!(env = client.environment_name(), "Bootstrapping environment");
        let bootstrapped = tokio::select! {
            result = self.bootstrap(client) => result,
            () = &mut interrupt => {
                tracing::warn!("Interrupted during bootstrap, cleaning up");
                Err(Error::Interrupted)
            }
        };
        if let Err(e) = bootstrapped {
            tracing::error!(error = %e, "Bootstrap failed");
            self.collect_logs(client).await;
            if let Err(teardown) = self.tear_down(client).await {
                tracing::warn!(error = %teardown, "Teardown after failed bootstrap also failed");
            }
            return Err(e);
        }

        let outcome = tokio::select! {
            outcome = AssertUnwindSafe(action(client)).catch_unwind() => outcome,
            () = &mut interrupt => {
                tracing::warn!("Interrupted, cleaning up");
                Ok(Err(Error::Interrupted))
            }
        };

        self.collect_logs(client).await;
        let teardown = self.tear_down(client).await;

        match outcome {
            Err(panic) => std::panic::resume_unwind(panic),
            Ok(Err(e)) => {
                if let Err(teardown) = teardown {
                    tracing::warn!(error = %teardown, "Teardown failed");
                }
                Err(e)
            }
            Ok(Ok(())) => teardown,
        }
    }

    async fn bootstrap<C: BootstrapClient>(&self, client: &C) -> Result<()> {
        client.bootstrap(&self.options()).await?;
        if !self.machines.is_empty() {
            client.add_ssh_machines(&self.machines).await?;
        }
        Ok(())
    }

    async fn collect_logs<C: BootstrapClient>(&self, client: &C) {
        if let Err(e) = std::fs::create_dir_all(&self.log_dir) {
            tracing::warn!(error = %e, log_dir = %self.log_dir.display(), "Cannot create log dir");
            return;
        }
        if let Err(e) = client.dump_logs(&self.log_dir).await {
            tracing::warn!(error = %e, "Failed to collect environment logs");
        }
    }

    async fn tear_down<C: BootstrapClient>(&self, client: &C) -> Result<()> {
        if self.keep_env {
            tracing::info!(env = client.environment_name(), "Keeping environment");
            return Ok(());
        }
        client.tear_down().await
    }
}

/// Resolves on the first SIGINT or SIGTERM
///
/// Handlers are installed on first poll. If they cannot be installed the
/// future never resolves.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::warn!(error = %e, "Cannot install signal handlers");
                    return std::future::pending().await;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => tracing::info!("Received SIGTERM"),
            _ = sigint.recv() => tracing::info!("Received SIGINT (Ctrl+C)"),
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Cannot install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::tempdir;

    #[derive(Default)]
    struct FakeClient {
        name: String,
        home: Option<PathBuf>,
        calls: Mutex<Vec<String>>,
        fail_bootstrap: bool,
        hang_bootstrap: bool,
        fail_tear_down: bool,
    }

    impl FakeClient {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &str) {
            self.calls.lock().unwrap().push(call.to_string());
        }
    }

    #[async_trait]
    impl BootstrapClient for FakeClient {
        fn environment_name(&self) -> &str {
            &self.name
        }

        fn isolate(&mut self, temp: &TempEnvironment, juju_home: &Path) -> Result<()> {
            assert!(juju_home.is_dir());
            self.name = temp.name.clone();
            self.home = Some(juju_home.to_path_buf());
            self.record("isolate");
            Ok(())
        }

        async fn bootstrap(&self, options: &BootstrapOptions) -> Result<()> {
            self.record(&format!("bootstrap upload_tools={}", options.upload_tools));
            if self.fail_bootstrap {
                return Err(Error::juju_command("juju bootstrap", Some(1), b"no cloud"));
            }
            if self.hang_bootstrap {
                std::future::pending::<()>().await;
            }
            Ok(())
        }

        async fn add_ssh_machines(&self, machines: &[String]) -> Result<()> {
            self.record(&format!("add-machine {}", machines.join(",")));
            Ok(())
        }

        async fn dump_logs(&self, log_dir: &Path) -> Result<()> {
            assert!(log_dir.is_dir());
            self.record("dump_logs");
            Ok(())
        }

        async fn tear_down(&self) -> Result<()> {
            self.record("tear_down");
            if self.fail_tear_down {
                return Err(Error::juju_command("juju kill-controller", Some(1), b"busy"));
            }
            Ok(())
        }
    }

    fn manager(logs: &Path, extra: &[&str]) -> BootstrapManager {
        let mut argv = vec![
            "an-env".to_string(),
            "/bin/juju".to_string(),
            logs.display().to_string(),
            "an-env-mod".to_string(),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        let args = crate::cli::parse_args(argv).unwrap();
        BootstrapManager::from_args(&args)
    }

    #[tokio::test]
    async fn test_successful_action_is_torn_down() {
        let logs = tempdir().unwrap();
        let manager = manager(logs.path(), &[]);
        let mut client = FakeClient::default();

        manager
            .booted_context(&mut client, |c| async move {
                c.record("action");
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(
            client.calls(),
            vec!["isolate", "bootstrap upload_tools=false", "action", "dump_logs", "tear_down"]
        );
        assert_eq!(client.name, "an-env-mod");
        // The isolated home does not outlive the context
        assert!(!client.home.unwrap().exists());
    }

    #[tokio::test]
    async fn test_failing_action_is_torn_down_and_error_kept() {
        let logs = tempdir().unwrap();
        let manager = manager(logs.path(), &[]);
        let mut client = FakeClient {
            fail_tear_down: true,
            ..Default::default()
        };

        let err = manager
            .booted_context(&mut client, |_| async {
                Err(Error::agent_error("my-charm/0", "error"))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::AgentError { .. }));
        assert_eq!(client.calls().last().map(String::as_str), Some("tear_down"));
    }

    #[tokio::test]
    async fn test_teardown_error_surfaces_after_success() {
        let logs = tempdir().unwrap();
        let manager = manager(logs.path(), &[]);
        let mut client = FakeClient {
            fail_tear_down: true,
            ..Default::default()
        };

        let err = manager
            .booted_context(&mut client, |_| async { Ok(()) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::JujuCommand { .. }));
    }

    #[tokio::test]
    async fn test_panicking_action_is_torn_down() {
        let logs = tempdir().unwrap();
        let manager = manager(logs.path(), &[]);
        let mut client = FakeClient::default();

        let result = AssertUnwindSafe(manager.booted_context(&mut client, |_| async {
            panic!("assessment blew up");
        }))
        .catch_unwind()
        .await;

        assert!(result.is_err());
        assert_eq!(client.calls().last().map(String::as_str), Some("tear_down"));
    }

    #[tokio::test]
    async fn test_failed_bootstrap_skips_action() {
        let logs = tempdir().unwrap();
        let manager = manager(logs.path(), &[]);
        let mut client = FakeClient {
            fail_bootstrap: true,
            ..Default::default()
        };

        let err = manager
            .booted_context(&mut client, |c| async move {
                c.record("action");
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::JujuCommand { .. }));
        assert_eq!(
            client.calls(),
            vec!["isolate", "bootstrap upload_tools=false", "dump_logs", "tear_down"]
        );
    }

    #[tokio::test]
    async fn test_keep_env_and_machines() {
        let logs = tempdir().unwrap();
        let manager = manager(
            logs.path(),
            &["--keep-env", "--upload-tools", "--machine", "10.0.0.7", "--machine", "10.0.0.8"],
        );
        let mut client = FakeClient::default();

        manager
            .booted_context(&mut client, |_| async { Ok(()) })
            .await
            .unwrap();

        assert_eq!(
            client.calls(),
            vec![
                "isolate",
                "bootstrap upload_tools=true",
                "add-machine 10.0.0.7,10.0.0.8",
                "dump_logs",
            ]
        );
    }

    #[tokio::test]
    async fn test_interrupted_action_is_torn_down() {
        let logs = tempdir().unwrap();
        let manager = manager(logs.path(), &[]);
        let mut client = FakeClient::default();

        let err = manager
            .booted_context_until(
                &mut client,
                |c| async move {
                    c.record("action");
                    std::future::pending::<Result<()>>().await
                },
                tokio::time::sleep(Duration::from_millis(10)),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Interrupted));
        assert_eq!(
            client.calls(),
            vec!["isolate", "bootstrap upload_tools=false", "action", "dump_logs", "tear_down"]
        );
        assert!(!client.home.unwrap().exists());
    }

    #[tokio::test]
    async fn test_interrupted_bootstrap_is_torn_down() {
        let logs = tempdir().unwrap();
        let manager = manager(logs.path(), &[]);
        let mut client = FakeClient {
            hang_bootstrap: true,
            ..Default::default()
        };

        let err = manager
            .booted_context_until(
                &mut client,
                |c| async move {
                    c.record("action");
                    Ok(())
                },
                tokio::time::sleep(Duration::from_millis(10)),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Interrupted));
        assert_eq!(
            client.calls(),
            vec!["isolate", "bootstrap upload_tools=false", "dump_logs", "tear_down"]
        );
    }

    #[test]
    fn test_options_carry_series() {
        let logs = tempdir().unwrap();
        let manager = manager(logs.path(), &["--series", "xenial"]);
        assert_eq!(
            manager.options(),
            BootstrapOptions {
                upload_tools: false,
                bootstrap_series: Some("xenial".to_string()),
            }
        );
        assert_eq!(manager.temp_env().name, "an-env-mod");
    }
}

//! Process wrapper around the juju binary

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tokio::time::{sleep, Duration, Instant};

use super::environment::{Environment, TempEnvironment};
use super::status::{AgentProgress, Status};
use super::version::{get_juju_version, Dialect, JujuVersion};
use super::ClusterClient;
use crate::bootstrap::{BootstrapClient, BootstrapOptions};
use crate::common::config::Config;
use crate::common::{Error, Result};

/// Files copied from the real Juju home into the run's isolated home
const CREDENTIAL_FILES: &[&str] = &["credentials.yaml", "clouds.yaml"];

/// A juju binary of known version bound to one environment
#[derive(Debug)]
pub struct JujuClient {
    env: Environment,
    binary: PathBuf,
    version: JujuVersion,
    debug: bool,
    config: Config,
}

impl JujuClient {
    pub fn new(
        env: Environment,
        binary: PathBuf,
        version: JujuVersion,
        debug: bool,
        config: Config,
    ) -> Self {
        Self {
            env,
            binary,
            version,
            debug,
            config,
        }
    }

    /// Build a client for whatever juju version `juju_bin` reports
    ///
    /// Bare names such as `juju` are looked up on PATH.
    pub async fn by_version(
        env: Environment,
        juju_bin: &Path,
        debug: bool,
        config: Config,
    ) -> Result<Self> {
        let binary = resolve_binary(juju_bin)?;
        let version = get_juju_version(&binary).await?;
        tracing::info!(binary = %binary.display(), %version, "Using juju");
        Ok(Self::new(env, binary, version, debug, config))
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn version(&self) -> &JujuVersion {
        &self.version
    }

    pub fn dialect(&self) -> Dialect {
        self.version.dialect()
    }

    /// Arguments for one juju invocation, without the binary itself
    ///
    /// `targeted` commands get `-e`/`-m <env>` after the command name.
    pub fn full_args<S: AsRef<str>>(&self, command: &str, args: &[S], targeted: bool) -> Vec<String> {
        let mut argv = Vec::with_capacity(args.len() + 4);
        argv.push(if self.debug { "--debug" } else { "--show-log" }.to_string());
        argv.push(command.to_string());
        if targeted {
            argv.push(self.dialect().target_flag().to_string());
            argv.push(self.env.name.clone());
        }
        argv.extend(args.iter().map(|a| a.as_ref().to_string()));
        argv
    }

    /// Arguments after `bootstrap` for this client's dialect
    pub fn bootstrap_args(&self, options: &BootstrapOptions) -> Result<Vec<String>> {
        let constraints = self.config.bootstrap.constraints.clone();
        let mut args = match self.dialect() {
            Dialect::Environments => vec!["--constraints".to_string(), constraints],
            Dialect::Models => {
                let config_file = self.env.write_config_file(&self.env.juju_home)?;
                vec![
                    "--constraints".to_string(),
                    constraints,
                    self.env.name.clone(),
                    self.env.cloud_region()?,
                    "--config".to_string(),
                    config_file.display().to_string(),
                    "--default-model".to_string(),
                    self.env.name.clone(),
                ]
            }
        };
        if options.upload_tools {
            args.push("--upload-tools".to_string());
        }
        if let Some(series) = &options.bootstrap_series {
            args.push("--bootstrap-series".to_string());
            args.push(series.clone());
        }
        Ok(args)
    }

    async fn run<S: AsRef<str>>(&self, command: &str, args: &[S], targeted: bool) -> Result<Output> {
        let argv = self.full_args(command, args, targeted);
        let command_line = format!("{} {}", self.binary.display(), argv.join(" "));
        tracing::debug!(command = %command_line, "Running juju");

        let mut cmd = Command::new(&self.binary);
        cmd.args(&argv)
            .env("JUJU_HOME", &self.env.juju_home)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if self.dialect() == Dialect::Models {
            cmd.env("JUJU_DATA", &self.env.juju_home);
        }

        let output = cmd.output().await.map_err(|source| Error::JujuSpawn {
            command: command_line.clone(),
            source,
        })?;
        if !output.status.success() {
            return Err(Error::juju_command(&command_line, output.status.code(), &output.stderr));
        }
        Ok(output)
    }

    /// Run a juju command for its effect
    pub async fn juju<S: AsRef<str>>(&self, command: &str, args: &[S]) -> Result<()> {
        let output = self.run(command, args, true).await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::debug!(command, output = %stdout.trim(), "juju output");
        }
        Ok(())
    }

    /// Run a juju command and return its stdout
    pub async fn get_juju_output<S: AsRef<str>>(&self, command: &str, args: &[S]) -> Result<String> {
        let output = self.run(command, args, true).await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    pub async fn get_status(&self) -> Result<Status> {
        let text = self.get_juju_output("status", &["--format", "yaml"]).await?;
        Status::from_yaml(&text)
    }
}

fn resolve_binary(juju_bin: &Path) -> Result<PathBuf> {
    if juju_bin.exists() {
        // Command::new looks bare names up on PATH, not in the working dir
        return Ok(std::path::absolute(juju_bin)?);
    }
    if juju_bin.components().count() == 1 {
        return which::which(juju_bin).map_err(|e| Error::JujuNotFound {
            path: juju_bin.to_path_buf(),
            reason: e.to_string(),
        });
    }
    Err(Error::JujuNotFound {
        path: juju_bin.to_path_buf(),
        reason: "no such file".to_string(),
    })
}

/// Deadline `secs` from now, or none when that is past what `Instant` can hold
fn deadline_after(secs: u64) -> Option<Instant> {
    Instant::now().checked_add(Duration::from_secs(secs))
}

#[async_trait]
impl ClusterClient for JujuClient {
    async fn deploy(&self, charm: &str) -> Result<()> {
        self.juju("deploy", &[charm]).await
    }

    async fn wait_for_started(&self) -> Result<()> {
        let timeouts = &self.config.timeouts;
        let deadline = deadline_after(timeouts.started_secs);

        loop {
            match self.get_status().await?.check_agents_started()? {
                AgentProgress::Started => {
                    tracing::info!(env = %self.env.name, "All agents started");
                    return Ok(());
                }
                AgentProgress::Pending(pending) => {
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        return Err(Error::StartedTimeout {
                            secs: timeouts.started_secs,
                            pending: pending.join(", "),
                        });
                    }
                    tracing::debug!(pending = %pending.join(", "), "Waiting for agents");
                    sleep(Duration::from_secs(timeouts.status_interval_secs)).await;
                }
            }
        }
    }
}

#[async_trait]
impl BootstrapClient for JujuClient {
    fn environment_name(&self) -> &str {
        &self.env.name
    }

    fn isolate(&mut self, temp: &TempEnvironment, juju_home: &Path) -> Result<()> {
        for name in CREDENTIAL_FILES {
            let source = self.env.juju_home.join(name);
            if source.exists() {
                std::fs::copy(&source, juju_home.join(name))?;
            }
        }
        self.env.apply(temp);
        self.env.write_environments_file(juju_home)?;
        self.env.juju_home = juju_home.to_path_buf();
        Ok(())
    }

    async fn bootstrap(&self, options: &BootstrapOptions) -> Result<()> {
        let args = self.bootstrap_args(options)?;
        let targeted = self.dialect() == Dialect::Environments;
        let output = self.run("bootstrap", args.as_slice(), targeted).await?;
        tracing::debug!(output = %String::from_utf8_lossy(&output.stdout).trim(), "Bootstrap finished");
        Ok(())
    }

    async fn add_ssh_machines(&self, machines: &[String]) -> Result<()> {
        for machine in machines {
            self.juju("add-machine", &[format!("ssh:{machine}")]).await?;
        }
        Ok(())
    }

    async fn dump_logs(&self, log_dir: &Path) -> Result<()> {
        let status = self
            .get_juju_output("status", &["--format", "yaml"])
            .await
            .and_then(|text| Ok(std::fs::write(log_dir.join("status.yaml"), text)?));

        // 1.x debug-log cannot stop tailing
        let debug_log = match self.dialect() {
            Dialect::Environments => Ok(()),
            Dialect::Models => {
                let lines = self.config.logs.debug_log_lines.to_string();
                self.get_juju_output("debug-log", &["--no-tail", "--lines", lines.as_str()])
                    .await
                    .and_then(|text| Ok(std::fs::write(log_dir.join("debug-log.txt"), text)?))
            }
        };

        status.and(debug_log)
    }

    async fn tear_down(&self) -> Result<()> {
        let name = self.env.name.as_str();
        match self.dialect() {
            Dialect::Environments => {
                self.run("destroy-environment", &[name, "--force", "-y"], false)
                    .await?
            }
            Dialect::Models => self.run("kill-controller", &[name, "-y"], false).await?,
        };
        tracing::info!(env = %name, "Environment torn down");
        Ok(())
    }
}

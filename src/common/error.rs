//! Error types for the assessment harness
//!
//! Client errors keep the juju command line and its stderr so a failed run
//! can be diagnosed from the harness output alone.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Usage Errors ===
    /// Malformed invocation or `--help`; clap renders and exits
    #[error("{0}")]
    Usage(#[from] clap::Error),

    // === Charm Errors ===
    #[error("Failed to write charm metadata '{}': {source}", .path.display())]
    DescriptorWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    // === Environment Errors ===
    #[error("Environment '{name}' not found in {}", .path.display())]
    EnvironmentNotFound { name: String, path: PathBuf },

    #[error("Invalid environments file '{}': {reason}", .path.display())]
    EnvironmentsFile { path: PathBuf, reason: String },

    #[error("Could not determine JUJU_HOME: set the JUJU_HOME environment variable")]
    JujuHomeUnknown,

    // === Client Errors ===
    #[error("Juju binary '{}' not found: {reason}", .path.display())]
    JujuNotFound { path: PathBuf, reason: String },

    #[error("Failed to run '{command}': {source}")]
    JujuSpawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("'{command}' exited with code {code:?}: {stderr}")]
    JujuCommand {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Unrecognised juju version '{0}'")]
    VersionParse(String),

    #[error("Failed to parse juju status: {0}")]
    StatusParse(#[source] serde_yaml::Error),

    #[error("Agent {agent} is in state '{state}'")]
    AgentError { agent: String, state: String },

    #[error("Timed out after {secs} seconds waiting for agents to start (pending: {pending})")]
    StartedTimeout { secs: u64, pending: String },

    /// SIGINT or SIGTERM arrived while the environment was up
    #[error("Interrupted by signal")]
    Interrupted,

    // === Configuration Errors ===
    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create a juju command failure from a finished process
    pub fn juju_command(command: &str, code: Option<i32>, stderr: &[u8]) -> Self {
        Self::JujuCommand {
            command: command.to_string(),
            code,
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }

    /// Create an agent error
    pub fn agent_error(agent: &str, state: &str) -> Self {
        Self::AgentError {
            agent: agent.to_string(),
            state: state.to_string(),
        }
    }
}

//! Environment profiles from `environments.yaml`
//!
//! A profile is read from the Juju home, re-targeted at a temporary
//! environment name and written into an isolated home for the run.

use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

use crate::common::{paths, Error, Result};

/// File holding the environment profiles inside a Juju home
pub const ENVIRONMENTS_FILE: &str = "environments.yaml";

/// Keys that describe where to bootstrap rather than how to configure it
const PLACEMENT_KEYS: &[&str] = &["name", "type", "cloud", "region", "bootstrap-host"];

/// A named environment profile
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub name: String,
    pub config: Mapping,
    pub juju_home: PathBuf,
}

/// Settings that turn a profile into the run's temporary environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempEnvironment {
    pub name: String,
    pub region: Option<String>,
    pub series: Option<String>,
    pub agent_url: Option<String>,
    pub agent_stream: Option<String>,
    /// Host for the manual provider
    pub bootstrap_host: Option<String>,
}

impl Environment {
    /// Load a profile by name from the default Juju home
    pub fn from_config(name: &str) -> Result<Self> {
        let home = paths::juju_home().ok_or(Error::JujuHomeUnknown)?;
        Self::from_juju_home(&home, name)
    }

    /// Load a profile by name from `juju_home/environments.yaml`
    pub fn from_juju_home(juju_home: &Path, name: &str) -> Result<Self> {
        let path = juju_home.join(ENVIRONMENTS_FILE);
        let content = std::fs::read_to_string(&path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        let document: Value =
            serde_yaml::from_str(&content).map_err(|e| Error::EnvironmentsFile {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let environments = document
            .get("environments")
            .and_then(Value::as_mapping)
            .ok_or_else(|| Error::EnvironmentsFile {
                path: path.clone(),
                reason: "missing 'environments' mapping".to_string(),
            })?;

        let config = match environments.get(name) {
            Some(Value::Mapping(config)) => config.clone(),
            Some(Value::Null) => Mapping::new(),
            Some(_) => {
                return Err(Error::EnvironmentsFile {
                    path,
                    reason: format!("environment '{name}' is not a mapping"),
                })
            }
            None => {
                return Err(Error::EnvironmentNotFound {
                    name: name.to_string(),
                    path,
                })
            }
        };

        Ok(Self {
            name: name.to_string(),
            config,
            juju_home: juju_home.to_path_buf(),
        })
    }

    /// String value of a config key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.config
            .insert(Value::from(key), Value::from(value.to_string()));
    }

    /// Re-target the profile at the run's temporary environment
    pub fn apply(&mut self, temp: &TempEnvironment) {
        self.name = temp.name.clone();
        if let Some(region) = &temp.region {
            self.set("region", region);
        }
        if let Some(series) = &temp.series {
            self.set("default-series", series);
        }
        if let Some(url) = &temp.agent_url {
            self.set("agent-metadata-url", url);
        }
        if let Some(stream) = &temp.agent_stream {
            self.set("agent-stream", stream);
        }
        if let Some(host) = &temp.bootstrap_host {
            self.set("bootstrap-host", host);
        }
    }

    /// Cloud argument for a 2.x bootstrap, `<cloud>[/<region>]`
    pub fn cloud_region(&self) -> Result<String> {
        let cloud = match self.get("cloud") {
            Some(cloud) => cloud,
            None => match self.get("type") {
                Some("ec2") => "aws",
                Some("gce") => "google",
                Some("local") => "lxd",
                Some(provider) => provider,
                None => {
                    return Err(Error::EnvironmentsFile {
                        path: self.juju_home.join(ENVIRONMENTS_FILE),
                        reason: format!("environment '{}' has no 'type' or 'cloud'", self.name),
                    })
                }
            },
        };
        let region = match cloud {
            "manual" => self.get("bootstrap-host"),
            _ => self.get("region"),
        };
        Ok(match region {
            Some(region) => format!("{cloud}/{region}"),
            None => cloud.to_string(),
        })
    }

    /// Write this profile as the only entry of `home/environments.yaml`
    pub fn write_environments_file(&self, home: &Path) -> Result<PathBuf> {
        let mut environments = Mapping::new();
        environments.insert(Value::from(self.name.clone()), Value::Mapping(self.config.clone()));
        let mut document = Mapping::new();
        document.insert(Value::from("environments"), Value::Mapping(environments));

        let path = home.join(ENVIRONMENTS_FILE);
        std::fs::write(&path, serde_yaml::to_string(&document)?)?;
        Ok(path)
    }

    /// Write the model config passed to a 2.x bootstrap via `--config`
    pub fn write_config_file(&self, home: &Path) -> Result<PathBuf> {
        let config: Mapping = self
            .config
            .iter()
            .filter(|(key, _)| !key.as_str().is_some_and(|k| PLACEMENT_KEYS.contains(&k)))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let path = home.join(format!("{}-config.yaml", self.name));
        std::fs::write(&path, serde_yaml::to_string(&config)?)?;
        Ok(path)
    }
}

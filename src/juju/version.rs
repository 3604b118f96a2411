//! Juju version detection
//!
//! `juju --version` prints `<number>[-<tag>]-<series>-<arch>`, e.g.
//! `1.25.3-trusty-amd64` or `2.0-beta6-xenial-amd64`. The number may have
//! two components, so it is padded before handing it to semver.

use semver::{Prerelease, Version};
use std::fmt;

use crate::common::{Error, Result};

/// Pre-release tags juju uses between the number and the series
const PRERELEASE_TAGS: &[&str] = &["alpha", "beta", "rc"];

/// A parsed juju client version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JujuVersion {
    raw: String,
    version: Version,
}

/// Command-line dialect spoken by a juju client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// 1.x: environments, `-e`, `destroy-environment`
    Environments,
    /// 2.x and later: controllers and models, `-m`, `kill-controller`
    Models,
}

impl JujuVersion {
    /// Parse the first line of `juju --version` output
    pub fn parse(output: &str) -> Result<Self> {
        let raw = output.lines().next().unwrap_or("").trim().to_string();
        let mut parts = raw.split('-');
        let number = parts.next().unwrap_or("");

        let mut components: Vec<u64> = Vec::with_capacity(3);
        for part in number.split('.') {
            let value = part
                .parse::<u64>()
                .map_err(|_| Error::VersionParse(raw.clone()))?;
            components.push(value);
        }
        if components.is_empty() || components.len() > 3 {
            return Err(Error::VersionParse(raw));
        }
        components.resize(3, 0);

        let mut version = Version::new(components[0], components[1], components[2]);
        if let Some(tag) = parts
            .next()
            .filter(|tag| PRERELEASE_TAGS.iter().any(|p| tag.starts_with(p)))
        {
            version.pre = Prerelease::new(tag).map_err(|_| Error::VersionParse(raw.clone()))?;
        }

        Ok(Self { raw, version })
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn dialect(&self) -> Dialect {
        if self.version.major < 2 {
            Dialect::Environments
        } else {
            Dialect::Models
        }
    }
}

impl fmt::Display for JujuVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Dialect {
    /// Flag selecting the environment (1.x) or model (2.x) for a command
    pub fn target_flag(self) -> &'static str {
        match self {
            Dialect::Environments => "-e",
            Dialect::Models => "-m",
        }
    }
}

/// Retrieve and parse the version of a juju binary
pub async fn get_juju_version(path: &std::path::Path) -> Result<JujuVersion> {
    let command = format!("{} --version", path.display());
    let output = tokio::process::Command::new(path)
        .arg("--version")
        .output()
        .await
        .map_err(|source| Error::JujuSpawn {
            command: command.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(Error::juju_command(&command, output.status.code(), &output.stderr));
    }
    JujuVersion::parse(&String::from_utf8_lossy(&output.stdout))
}

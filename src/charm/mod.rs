//! Charm scaffolding
//!
//! Writes the minimal `metadata.yaml` a charm needs so scenario tests can
//! build throwaway charms on disk.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::common::{Error, Result};

/// File name of the charm descriptor
pub const METADATA_FILE: &str = "metadata.yaml";

/// Charm name used when the caller does not pick one
pub const DEFAULT_CHARM_NAME: &str = "my-charm";

/// Contents of a charm's `metadata.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharmMetadata {
    pub name: String,
    #[serde(rename = "min-juju-version")]
    pub min_juju_version: String,
    pub summary: String,
    /// Series the charm supports; omitted for single-series charms
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub series: Vec<String>,
}

impl CharmMetadata {
    pub fn new(name: &str, min_juju_version: &str) -> Self {
        Self {
            name: name.to_string(),
            min_juju_version: min_juju_version.to_string(),
            summary: "summary".to_string(),
            series: Vec::new(),
        }
    }

    /// Declare the series a multi-series charm supports
    pub fn with_series<S: AsRef<str>>(mut self, series: &[S]) -> Self {
        self.series = series.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    /// Write `metadata.yaml` into `dir`, replacing any existing file
    ///
    /// The document is written to a temporary file in `dir` and renamed into
    /// place, so readers never observe a partial file. `dir` must exist.
    pub fn write(&self, dir: &Path) -> Result<()> {
        let path = dir.join(METADATA_FILE);
        let write_err = |source: std::io::Error| Error::DescriptorWrite {
            path: path.clone(),
            source,
        };

        let yaml = serde_yaml::to_string(self)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(yaml.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;

        tracing::debug!(path = %path.display(), name = %self.name, "Wrote charm metadata");
        Ok(())
    }

    /// Read `metadata.yaml` back from a charm directory
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(METADATA_FILE);
        let content = std::fs::read_to_string(&path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Ok(serde_yaml::from_str(&content)?)
    }
}

/// Write a minimal charm descriptor into `charm_dir`
///
/// `name` falls back to [`DEFAULT_CHARM_NAME`].
pub fn make_charm(charm_dir: &Path, min_ver: &str, name: Option<&str>) -> Result<()> {
    CharmMetadata::new(name.unwrap_or(DEFAULT_CHARM_NAME), min_ver).write(charm_dir)
}

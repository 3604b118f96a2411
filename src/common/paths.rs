//! Filesystem locations used by the harness
//!
//! - Juju home: `$JUJU_HOME`, falling back to `~/cloud-city`
//! - Harness config: platform config dir, e.g. `~/.config/juju-assess/config.toml`

use std::io;
use std::path::{Path, PathBuf};

/// Name used for the harness config directory
const APP_NAME: &str = "juju-assess";

/// Directory holding `environments.yaml` when `JUJU_HOME` is unset
const DEFAULT_JUJU_HOME: &str = "cloud-city";

/// File name of the harness log inside the run's log directory
pub const LOG_FILE_NAME: &str = "assess.log";

/// Get the Juju home holding the environment profiles
pub fn juju_home() -> Option<PathBuf> {
    if let Some(home) = std::env::var_os("JUJU_HOME") {
        if !home.is_empty() {
            return Some(PathBuf::from(home));
        }
    }
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(DEFAULT_JUJU_HOME))
}

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Ensure the run's log directory exists
///
/// Returns true when the directory already held files, which usually means
/// artifacts from an earlier run will be mixed with this one.
pub fn ensure_log_dir(dir: &Path) -> io::Result<bool> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
        return Ok(false);
    }
    Ok(std::fs::read_dir(dir)?.next().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_path_is_toml() {
        if let Some(path) = config_path() {
            assert_eq!(path.file_name().unwrap(), "config.toml");
        }
    }

    #[test]
    fn test_ensure_log_dir_creates_missing() {
        let dir = tempdir().unwrap();
        let logs = dir.path().join("logs");
        assert!(!ensure_log_dir(&logs).unwrap());
        assert!(logs.is_dir());
    }

    #[test]
    fn test_ensure_log_dir_reports_existing_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("old.log"), "x").unwrap();
        assert!(ensure_log_dir(dir.path()).unwrap());
    }
}

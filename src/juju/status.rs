//! `juju status --format yaml` documents
//!
//! 1.x reports `agent-state` and lists `services`; 2.x nests the agent state
//! under `juju-status.current` and lists `applications`. Both deserialize
//! into [`Status`].

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::common::{Error, Result};

/// Agent states meaning the agent is up and settled
const STARTED_STATES: &[&str] = &["started", "idle"];

/// A status snapshot of one environment
#[derive(Debug, Deserialize, Default)]
pub struct Status {
    #[serde(default)]
    pub machines: BTreeMap<String, AgentEntry>,
    #[serde(default, alias = "services")]
    pub applications: BTreeMap<String, Application>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Application {
    #[serde(default)]
    pub charm: Option<String>,
    #[serde(default)]
    pub units: BTreeMap<String, AgentEntry>,
}

/// Status of a machine or unit agent
#[derive(Debug, Deserialize, Default)]
pub struct AgentEntry {
    #[serde(rename = "agent-state")]
    pub agent_state: Option<String>,
    #[serde(rename = "agent-state-info")]
    pub agent_state_info: Option<String>,
    #[serde(rename = "juju-status")]
    pub juju_status: Option<StatusInfo>,
}

#[derive(Debug, Deserialize, Default)]
pub struct StatusInfo {
    pub current: Option<String>,
    pub message: Option<String>,
}

/// Outcome of one status check while waiting for agents
#[derive(Debug, PartialEq, Eq)]
pub enum AgentProgress {
    /// Every agent reports a started state
    Started,
    /// Agents still coming up, as `name (state)`
    Pending(Vec<String>),
}

impl AgentEntry {
    /// Current agent state in either dialect
    pub fn state(&self) -> &str {
        self.juju_status
            .as_ref()
            .and_then(|s| s.current.as_deref())
            .or(self.agent_state.as_deref())
            .unwrap_or("pending")
    }

    fn info(&self) -> Option<&str> {
        self.juju_status
            .as_ref()
            .and_then(|s| s.message.as_deref())
            .or(self.agent_state_info.as_deref())
    }
}

impl Status {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(Error::StatusParse)
    }

    /// All machine and unit agents, machines first
    pub fn iter_agents(&self) -> impl Iterator<Item = (String, &AgentEntry)> {
        let machines = self
            .machines
            .iter()
            .map(|(id, entry)| (format!("machine-{id}"), entry));
        let units = self
            .applications
            .values()
            .flat_map(|app| app.units.iter())
            .map(|(name, entry)| (name.clone(), entry));
        machines.chain(units)
    }

    /// Classify the snapshot; an agent in an error state fails immediately
    pub fn check_agents_started(&self) -> Result<AgentProgress> {
        let mut pending = Vec::new();
        for (name, entry) in self.iter_agents() {
            let state = entry.state();
            if state.starts_with("error") {
                let state = match entry.info() {
                    Some(info) => format!("{state}: {info}"),
                    None => state.to_string(),
                };
                return Err(Error::agent_error(&name, &state));
            }
            if !STARTED_STATES.contains(&state) {
                pending.push(format!("{name} ({state})"));
            }
        }

        if pending.is_empty() {
            Ok(AgentProgress::Started)
        } else {
            Ok(AgentProgress::Pending(pending))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JUJU1_STARTED: &str = r#"
environment: an-env-mod
machines:
  "0":
    agent-state: started
    dns-name: 10.0.0.2
  "1":
    agent-state: started
services:
  my-charm:
    charm: local:trusty/my-charm-0
    units:
      my-charm/0:
        agent-state: started
        machine: "1"
"#;

    const JUJU2_PENDING: &str = r#"
model: an-env-mod
machines:
  "0":
    juju-status:
      current: started
  "1":
    juju-status:
      current: pending
applications:
  my-charm:
    charm: local:trusty/my-charm-0
    units:
      my-charm/0:
        juju-status:
          current: allocating
        workload-status:
          current: waiting
"#;

    const JUJU2_ERROR: &str = r#"
machines:
  "0":
    juju-status:
      current: started
applications:
  my-charm:
    units:
      my-charm/0:
        juju-status:
          current: error
          message: 'hook failed: "install"'
"#;

    #[test]
    fn test_juju1_all_started() {
        let status = Status::from_yaml(JUJU1_STARTED).unwrap();
        assert_eq!(status.applications.len(), 1);
        assert_eq!(
            status.applications["my-charm"].charm.as_deref(),
            Some("local:trusty/my-charm-0")
        );
        assert_eq!(status.check_agents_started().unwrap(), AgentProgress::Started);
    }

    #[test]
    fn test_juju2_pending_lists_agents() {
        let status = Status::from_yaml(JUJU2_PENDING).unwrap();
        assert_eq!(
            status.check_agents_started().unwrap(),
            AgentProgress::Pending(vec![
                "machine-1 (pending)".to_string(),
                "my-charm/0 (allocating)".to_string(),
            ])
        );
    }

    #[test]
    fn test_juju2_error_fails_fast() {
        let status = Status::from_yaml(JUJU2_ERROR).unwrap();
        match status.check_agents_started() {
            Err(Error::AgentError { agent, state }) => {
                assert_eq!(agent, "my-charm/0");
                assert_eq!(state, "error: hook failed: \"install\"");
            }
            other => panic!("Expected AgentError, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_state_is_pending() {
        let status = Status::from_yaml("machines:\n  \"0\": {}\n").unwrap();
        assert_eq!(
            status.check_agents_started().unwrap(),
            AgentProgress::Pending(vec!["machine-0 (pending)".to_string()])
        );
    }

    #[test]
    fn test_invalid_document() {
        assert!(matches!(
            Status::from_yaml("machines: [unclosed"),
            Err(Error::StatusParse(_))
        ));
    }
}

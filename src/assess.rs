//! Multi-series charm assessment
//!
//! Deploys a local charm into a bootstrapped environment and waits until its
//! agents report started.

use crate::common::Result;
use crate::juju::ClusterClient;

/// Charm deployed by the assessment
pub const CHARM_REFERENCE: &str = "local:trusty/my-charm";

/// Deploy [`CHARM_REFERENCE`] and block until the deployment has started
///
/// Client errors are returned as-is; waiting and retrying belong to
/// [`ClusterClient::wait_for_started`].
pub async fn assess_multi_series_charms<C: ClusterClient + ?Sized>(client: &C) -> Result<()> {
    tracing::info!(charm = CHARM_REFERENCE, "Deploying charm");
    client.deploy(CHARM_REFERENCE).await?;
    client.wait_for_started().await?;
    tracing::info!(charm = CHARM_REFERENCE, "Charm deployment started");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingClient {
        calls: Mutex<Vec<String>>,
        fail_deploy: bool,
    }

    #[async_trait]
    impl ClusterClient for RecordingClient {
        async fn deploy(&self, charm: &str) -> Result<()> {
            self.calls.lock().unwrap().push(format!("deploy {charm}"));
            if self.fail_deploy {
                return Err(Error::juju_command("juju deploy", Some(1), b"charm not found"));
            }
            Ok(())
        }

        async fn wait_for_started(&self) -> Result<()> {
            self.calls.lock().unwrap().push("wait_for_started".to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_multi_series_charms() {
        let client = RecordingClient::default();
        assess_multi_series_charms(&client).await.unwrap();

        assert_eq!(
            *client.calls.lock().unwrap(),
            vec!["deploy local:trusty/my-charm", "wait_for_started"]
        );
    }

    #[tokio::test]
    async fn test_deploy_error_propagates_unchanged() {
        let client = RecordingClient {
            fail_deploy: true,
            ..Default::default()
        };
        let err = assess_multi_series_charms(&client).await.unwrap_err();

        match err {
            Error::JujuCommand { stderr, .. } => assert_eq!(stderr, "charm not found"),
            other => panic!("Expected JujuCommand, got {other:?}"),
        }
        // No wait after a failed deploy
        assert_eq!(*client.calls.lock().unwrap(), vec!["deploy local:trusty/my-charm"]);
    }

    #[tokio::test]
    async fn test_works_through_trait_object() {
        let client: Box<dyn ClusterClient> = Box::new(RecordingClient::default());
        assess_multi_series_charms(client.as_ref()).await.unwrap();
    }
}

//! Job status tracking

use std::sync::Arc;

use stratwatch_client::RemoteJobClient;
use stratwatch_core::domain::job::{ExecutionStatus, JobHandle};
use tracing::{info, warn};

/// A change of the observed lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Option<ExecutionStatus>,
    pub to: ExecutionStatus,
}

/// Polls a job's status and remembers what has been observed
///
/// `poll` performs exactly one remote call and never retries; retries are
/// applied by the caller through the retry policy.
pub struct StatusTracker {
    client: Arc<dyn RemoteJobClient>,
    handle: JobHandle,
    last: Option<ExecutionStatus>,
    started: bool,
}

impl StatusTracker {
    pub fn new(client: Arc<dyn RemoteJobClient>, handle: JobHandle) -> Self {
        Self {
            client,
            handle,
            last: None,
            started: false,
        }
    }

    /// Fetches the current status once
    ///
    /// Unrecognized status text maps to [`ExecutionStatus::Unknown`] and is
    /// logged rather than raised.
    pub async fn poll(&self) -> stratwatch_client::Result<ExecutionStatus> {
        let text = self.client.job_status(&self.handle).await?;
        let status = ExecutionStatus::from_status_text(&text);

        if status == ExecutionStatus::Unknown {
            warn!("Unrecognized status '{}' for {}", text, self.handle);
        }

        Ok(status)
    }

    /// Records an observed status, returning the transition if it changed
    pub fn observe(&mut self, status: ExecutionStatus) -> Option<Transition> {
        if status != ExecutionStatus::Starting && status != ExecutionStatus::Unknown {
            self.started = true;
        }

        if self.last == Some(status) {
            return None;
        }

        let transition = Transition {
            from: self.last,
            to: status,
        };
        info!(
            "{} status: {} -> {}",
            self.handle,
            transition.from.map_or("-", ExecutionStatus::as_str),
            status
        );
        self.last = Some(status);
        Some(transition)
    }

    /// Most recently observed status
    pub fn last(&self) -> Option<ExecutionStatus> {
        self.last
    }

    /// Whether the job has been seen past `Starting`
    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn is_terminal(&self) -> bool {
        self.last.is_some_and(ExecutionStatus::is_terminal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedClient;
    use stratwatch_client::ClientError;
    use stratwatch_core::domain::job::TradingMode;

    fn tracker(client: ScriptedClient) -> StatusTracker {
        StatusTracker::new(
            Arc::new(client),
            JobHandle::new("s1", TradingMode::PaperTrading),
        )
    }

    #[tokio::test]
    async fn test_poll_maps_status_text() {
        let tracker = tracker(ScriptedClient::new().statuses(["STARTING", "STARTED", "BOGUS"]));

        assert_eq!(tracker.poll().await.unwrap(), ExecutionStatus::Starting);
        assert_eq!(tracker.poll().await.unwrap(), ExecutionStatus::Started);
        assert_eq!(tracker.poll().await.unwrap(), ExecutionStatus::Unknown);
    }

    #[tokio::test]
    async fn test_poll_propagates_errors_without_retrying() {
        let client = ScriptedClient::new()
            .status_error(ClientError::from_status(504, ""))
            .statuses(["STARTED"]);
        let tracker = tracker(client);

        assert!(matches!(
            tracker.poll().await,
            Err(ClientError::GatewayTimeout(_))
        ));
        assert_eq!(tracker.poll().await.unwrap(), ExecutionStatus::Started);
    }

    #[test]
    fn test_observe_reports_transitions_only_on_change() {
        let mut tracker = tracker(ScriptedClient::new());

        let first = tracker.observe(ExecutionStatus::Starting).unwrap();
        assert_eq!(first.from, None);
        assert_eq!(first.to, ExecutionStatus::Starting);
        assert!(!tracker.has_started());

        assert!(tracker.observe(ExecutionStatus::Starting).is_none());

        let started = tracker.observe(ExecutionStatus::Started).unwrap();
        assert_eq!(started.from, Some(ExecutionStatus::Starting));
        assert!(tracker.has_started());
        assert!(!tracker.is_terminal());
    }

    #[test]
    fn test_unknown_never_terminal_and_keeps_started_flag() {
        let mut tracker = tracker(ScriptedClient::new());

        tracker.observe(ExecutionStatus::Unknown);
        assert!(!tracker.has_started());
        assert!(!tracker.is_terminal());

        tracker.observe(ExecutionStatus::Started);
        tracker.observe(ExecutionStatus::Unknown);
        assert!(tracker.has_started());
        assert!(!tracker.is_terminal());
        assert_eq!(tracker.last(), Some(ExecutionStatus::Unknown));

        tracker.observe(ExecutionStatus::Stopped);
        assert!(tracker.is_terminal());
    }

    #[test]
    fn test_already_started_on_first_poll() {
        let mut tracker = tracker(ScriptedClient::new());
        let transition = tracker.observe(ExecutionStatus::Started).unwrap();
        assert_eq!(transition.from, None);
        assert!(tracker.has_started());
    }
}

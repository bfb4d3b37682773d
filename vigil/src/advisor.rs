//! AI recommendation boundary.
//!
//! The outbound HTTP call lives outside this crate; a [`Recommender`]
//! supplies it. This module only builds the serialized payload from the
//! current projection, launches the call as an independent background task,
//! and lets the foreground poll for the recommended pid without ever
//! blocking on it.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::oneshot;

use crate::domain::{AdvisorError, Pid};
use crate::metrics::snapshot::ProcessRecord;

/// Wire record for one projected process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisorRecord {
    pub pid: i32,
    pub name: String,
    pub cpu_usage: f64,
    pub memory_usage: u64,
    pub network_usage: u64,
    pub cpu_time: u64,
}

/// Serialize the projected rows for the recommendation service.
#[must_use]
pub fn payload(rows: &[ProcessRecord]) -> Vec<AdvisorRecord> {
    rows.iter()
        .map(|record| AdvisorRecord {
            pid: record.pid.0,
            name: record.name.clone(),
            cpu_usage: record.cpu_percent,
            memory_usage: record.memory_kb,
            network_usage: record.net_delta,
            cpu_time: record.elapsed_secs,
        })
        .collect()
}

/// The external recommendation call: takes the serialized process list,
/// returns a single pid worth terminating.
pub trait Recommender: Send + Sync + 'static {
    /// # Errors
    /// Returns [`AdvisorError`] when the service is unreachable or answers
    /// with something other than a pid.
    fn recommend(&self, processes: &[AdvisorRecord]) -> Result<Pid, AdvisorError>;
}

/// Handle to one in-flight recommendation.
pub struct RecommendationTask {
    rx: oneshot::Receiver<Result<Pid, AdvisorError>>,
}

impl RecommendationTask {
    /// Non-blocking completion poll. `Some` once the task finished; callers
    /// drop the handle after that.
    pub fn poll(&mut self) -> Option<Result<Pid, AdvisorError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                Some(Err(AdvisorError::Unavailable("recommendation task dropped".to_string())))
            }
        }
    }
}

/// Launch a recommendation over the given rows on the runtime.
///
/// The recommender is a blocking call with unspecified latency, so it runs
/// on the blocking pool; the foreground polls the returned handle.
#[must_use]
pub fn spawn(
    runtime: &tokio::runtime::Handle,
    recommender: Arc<dyn Recommender>,
    rows: &[ProcessRecord],
) -> RecommendationTask {
    let records = payload(rows);
    let (tx, rx) = oneshot::channel();
    // Detached: completion is reported through the oneshot
    let _ = runtime.spawn_blocking(move || {
        let _ = tx.send(recommender.recommend(&records));
    });
    RecommendationTask { rx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn record(pid: i32) -> ProcessRecord {
        ProcessRecord {
            pid: Pid(pid),
            name: "chrome".to_string(),
            memory_kb: 5000,
            cpu_percent: 10.5,
            net_delta: 1024,
            elapsed_secs: 3600,
            command: "/opt/chrome".to_string(),
        }
    }

    #[test]
    fn test_payload_field_names_match_the_wire_format() {
        let json = serde_json::to_value(payload(&[record(1000)])).unwrap();
        let first = &json[0];
        assert_eq!(first["pid"], 1000);
        assert_eq!(first["name"], "chrome");
        assert_eq!(first["cpu_usage"], 10.5);
        assert_eq!(first["memory_usage"], 5000);
        assert_eq!(first["network_usage"], 1024);
        assert_eq!(first["cpu_time"], 3600);
    }

    struct Fixed(i32);
    impl Recommender for Fixed {
        fn recommend(&self, processes: &[AdvisorRecord]) -> Result<Pid, AdvisorError> {
            assert!(!processes.is_empty());
            Ok(Pid(self.0))
        }
    }

    #[tokio::test]
    async fn test_poll_returns_recommendation_without_blocking() {
        let mut task = spawn(
            &tokio::runtime::Handle::current(),
            Arc::new(Fixed(42)),
            &[record(42), record(43)],
        );

        for _ in 0..500 {
            if let Some(result) = task.poll() {
                assert_eq!(result.unwrap(), Pid(42));
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("recommendation never completed");
    }
}

//! Polling coordinator.
//!
//! Wraps a [`GatewayClient`] in a fixed-interval refresh loop and publishes
//! the last-known-good status to every consumer through a [`Snapshot`].
//!
//! ```text
//! Uninitialized → Healthy                      (first refresh ok)
//!               ↘ SetupAborted(Auth)           (first refresh, 401/403)
//!               ↘ SetupAborted(RetryLater)     (first refresh, anything else)
//!
//! Healthy ⇄ Unhealthy                          (later ticks)
//! Healthy/Unhealthy → Stopped                  (shutdown)
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use openclaw_common::GatewayResponse;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::error::Error;
use crate::gateway::GatewayClient;

/// Why a refresh failed. Reported to consumers, never raised into the poll loop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpdateFailure {
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    Connectivity(String),
    #[error("{0}")]
    Gateway(String),
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl UpdateFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateFailure::Authentication(_) => "authentication",
            UpdateFailure::Connectivity(_) => "connectivity",
            UpdateFailure::Gateway(_) => "gateway",
            UpdateFailure::Unexpected(_) => "unexpected",
        }
    }
}

impl From<&Error> for UpdateFailure {
    fn from(err: &Error) -> Self {
        match err {
            Error::Authentication { .. } => UpdateFailure::Authentication(err.to_string()),
            Error::Connectivity(_) => UpdateFailure::Connectivity(err.to_string()),
            Error::Gateway { .. } => UpdateFailure::Gateway(err.to_string()),
            Error::Transport(e) => UpdateFailure::Unexpected(e.to_string()),
        }
    }
}

/// Setup could not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    /// Credentials were rejected; retrying with the same token is pointless.
    #[error("{0}")]
    AuthFailed(String),

    /// The gateway is temporarily unavailable; setup should be retried later.
    #[error("Gateway not ready: {0}")]
    NotReady(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupAbort {
    Auth,
    RetryLater,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinatorState {
    #[default]
    Uninitialized,
    Healthy,
    Unhealthy,
    SetupAborted(SetupAbort),
    Stopped,
}

/// What consumers see. Replaced as a whole on success; on failure only the
/// status fields change and `data` keeps the last good response.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub data: Option<Arc<GatewayResponse>>,
    pub last_update_success: bool,
    pub last_error: Option<UpdateFailure>,
    pub last_updated: Option<DateTime<Utc>>,
    pub state: CoordinatorState,
}

pub struct Coordinator {
    name: String,
    client: GatewayClient,
    interval: Duration,
    snapshot: watch::Sender<Snapshot>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl Coordinator {
    pub fn new(name: impl Into<String>, client: GatewayClient, interval: Duration) -> Self {
        let (snapshot, _) = watch::channel(Snapshot::default());
        Self {
            name: name.into(),
            client,
            interval,
            snapshot,
            poller: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn client(&self) -> &GatewayClient {
        &self.client
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver notified every time the snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    pub fn data(&self) -> Option<Arc<GatewayResponse>> {
        self.snapshot.borrow().data.clone()
    }

    pub fn last_update_success(&self) -> bool {
        self.snapshot.borrow().last_update_success
    }

    pub fn state(&self) -> CoordinatorState {
        self.snapshot.borrow().state
    }

    /// Fetch status once and publish the outcome.
    ///
    /// Failures are recorded in the snapshot and returned as a value; this
    /// never panics, so the poll loop survives any gateway behaviour.
    pub async fn refresh(&self) -> Result<(), UpdateFailure> {
        if self.state() == CoordinatorState::Stopped {
            return Err(self.stopped());
        }

        match self.client.status().await {
            Ok(data) => {
                if !self.publish(data) {
                    return Err(self.stopped());
                }
                Ok(())
            }
            Err(err) => {
                let failure = UpdateFailure::from(&err);
                let was_healthy = self.last_update_success();

                self.snapshot.send_modify(|snapshot| {
                    snapshot.last_update_success = false;
                    snapshot.last_error = Some(failure.clone());
                    if snapshot.state != CoordinatorState::Stopped {
                        snapshot.state = CoordinatorState::Unhealthy;
                    }
                });

                if was_healthy {
                    tracing::warn!(kind = failure.kind(), "Error fetching {} data: {}", self.name, failure);
                } else {
                    tracing::debug!(kind = failure.kind(), "Error fetching {} data: {}", self.name, failure);
                }
                Err(failure)
            }
        }
    }

    fn stopped(&self) -> UpdateFailure {
        UpdateFailure::Connectivity(format!("{} coordinator is stopped", self.name))
    }

    /// Replace the snapshot with a fresh good response. Returns false, and
    /// leaves the snapshot alone, once the coordinator is stopped.
    fn publish(&self, data: GatewayResponse) -> bool {
        let mut recovered = false;
        let published = self.snapshot.send_if_modified(|snapshot| {
            if snapshot.state == CoordinatorState::Stopped {
                return false;
            }
            recovered = snapshot.last_error.is_some();
            *snapshot = Snapshot {
                data: Some(Arc::new(data)),
                last_update_success: true,
                last_error: None,
                last_updated: Some(Utc::now()),
                state: CoordinatorState::Healthy,
            };
            true
        });
        if recovered {
            tracing::info!("Fetching {} data recovered", self.name);
        }
        published
    }

    /// Setup-time refresh. Unlike steady-state polling, failure aborts setup
    /// and closes the transport.
    pub async fn first_refresh(&self) -> Result<(), SetupError> {
        let failure = match self.refresh().await {
            Ok(()) => return Ok(()),
            Err(failure) => failure,
        };

        self.client.close();

        let (abort, err) = match failure {
            UpdateFailure::Authentication(msg) => (SetupAbort::Auth, SetupError::AuthFailed(msg)),
            other => (SetupAbort::RetryLater, SetupError::NotReady(other.to_string())),
        };
        self.snapshot.send_modify(|snapshot| {
            snapshot.state = CoordinatorState::SetupAborted(abort);
        });

        tracing::error!("Setup of {} failed: {}", self.name, err);
        Err(err)
    }

    /// Spawn the poll task. The first tick fires one interval from now,
    /// since setup already ran [`Coordinator::first_refresh`].
    pub fn start(self: &Arc<Self>) {
        let coordinator = Arc::clone(self);
        let period = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // Outcome is already published to the snapshot.
                let _ = coordinator.refresh().await;
            }
        });

        let previous = self
            .poller
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }

        tracing::info!(
            "Polling {} every {} seconds",
            self.name,
            self.interval.as_secs_f64()
        );
    }

    /// Cancel the poll task and close the transport.
    pub fn shutdown(&self) {
        let handle = self
            .poller
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }

        self.client.close();
        self.snapshot.send_modify(|snapshot| {
            snapshot.state = CoordinatorState::Stopped;
        });
        tracing::debug!("{} coordinator stopped", self.name);
    }
}

use super::updater::park;
use crate::compute::broadcaster::TaskBroadcaster;
use crate::compute::jobs::scan_sum_task;
use crate::compute::types::BroadcastReport;
use crate::membership::error::MembershipError;

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct SenderSettings {
    pub cache_name: String,
    pub broadcasts_per_round: usize,
    /// Deadline for each round; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Pause before retrying when a round reached no server.
    pub idle_backoff: Duration,
}

impl Default for SenderSettings {
    fn default() -> Self {
        Self {
            cache_name: String::from("RecordsCache"),
            broadcasts_per_round: 3,
            timeout: Some(Duration::from_secs(30)),
            idle_backoff: Duration::from_secs(1),
        }
    }
}

/// Repeatedly broadcasts `scan_sum` tasks, one round at a time.
pub struct ComputeTasksSender {
    broadcaster: Arc<TaskBroadcaster>,
    settings: SenderSettings,
}

impl ComputeTasksSender {
    pub fn new(broadcaster: Arc<TaskBroadcaster>, settings: SenderSettings) -> Self {
        Self {
            broadcaster,
            settings,
        }
    }

    /// Starts `broadcasts_per_round` broadcasts, then waits for all of them.
    ///
    /// The timeout bounds the whole round, not each broadcast.
    pub async fn run_round(&self) -> Result<Vec<BroadcastReport>, MembershipError> {
        let deadline = self.settings.timeout.map(|timeout| Instant::now() + timeout);
        let mut pending = Vec::with_capacity(self.settings.broadcasts_per_round);
        for _ in 0..self.settings.broadcasts_per_round {
            pending.push(
                self.broadcaster
                    .broadcast(scan_sum_task(&self.settings.cache_name))
                    .await?,
            );
        }

        let mut reports = Vec::with_capacity(pending.len());
        for broadcast in pending {
            reports.push(broadcast.await_until(deadline).await);
        }

        Ok(reports)
    }

    /// Runs rounds until cancelled and returns the number of completed rounds.
    pub async fn run(self, shutdown: CancellationToken) -> u64 {
        tracing::info!(
            "Compute sender started ({} broadcasts per round on {})",
            self.settings.broadcasts_per_round,
            self.settings.cache_name
        );

        let mut rounds = 0u64;

        while !shutdown.is_cancelled() {
            let round = tokio::select! {
                _ = shutdown.cancelled() => break,
                round = self.run_round() => round,
            };

            match round {
                Ok(reports) => {
                    rounds += 1;
                    let reached: usize = reports.iter().map(|r| r.len()).sum();
                    let failed: usize = reports.iter().map(|r| r.failures() + r.timed_out()).sum();

                    if failed > 0 {
                        tracing::warn!(
                            "Round {}: {} of {} node executions failed or timed out",
                            rounds,
                            failed,
                            reached
                        );
                    } else {
                        tracing::debug!("Round {}: {} node executions", rounds, reached);
                    }

                    if reached == 0 {
                        tracing::debug!("No live server nodes, backing off");
                        if !park(self.settings.idle_backoff, &shutdown).await {
                            break;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Broadcast round failed: {}", e);
                    if !park(self.settings.idle_backoff, &shutdown).await {
                        break;
                    }
                }
            }
        }

        tracing::info!("Compute sender stopped after {} rounds", rounds);
        rounds
    }
}

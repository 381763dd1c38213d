use crate::storage::cache::Cache;

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct UpdaterSettings {
    pub puts_per_burst: usize,
    pub gets_per_burst: usize,
    /// Keys are drawn from `0..key_space`.
    pub key_space: i64,
    pub park: Duration,
}

impl Default for UpdaterSettings {
    fn default() -> Self {
        Self {
            puts_per_burst: 1000,
            gets_per_burst: 500,
            key_space: 5000,
            park: Duration::from_millis(2000),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdaterStats {
    pub puts: u64,
    pub gets: u64,
    pub hits: u64,
    pub errors: u64,
}

/// Writes and reads random keys in bursts, parking between bursts.
pub struct CacheUpdater {
    cache: Arc<dyn Cache>,
    settings: UpdaterSettings,
}

impl CacheUpdater {
    pub fn new(cache: Arc<dyn Cache>, settings: UpdaterSettings) -> Self {
        Self { cache, settings }
    }

    /// Loops `puts -> park -> gets -> park` until cancelled and returns the totals.
    pub async fn run(self, shutdown: CancellationToken) -> UpdaterStats {
        tracing::info!(
            "Cache updater started on {} ({} puts / {} gets per burst, park {:?})",
            self.cache.name(),
            self.settings.puts_per_burst,
            self.settings.gets_per_burst,
            self.settings.park
        );

        let mut totals = UpdaterStats::default();

        while !shutdown.is_cancelled() {
            let stats = self.put_burst().await;
            merge(&mut totals, &stats);
            if !park(self.settings.park, &shutdown).await {
                break;
            }

            let stats = self.get_burst().await;
            merge(&mut totals, &stats);
            if !park(self.settings.park, &shutdown).await {
                break;
            }

            tracing::debug!(
                "Cache updater totals: {} puts, {} gets ({} hits), {} errors",
                totals.puts,
                totals.gets,
                totals.hits,
                totals.errors
            );
        }

        tracing::info!("Cache updater stopped after {} puts", totals.puts);
        totals
    }

    pub async fn put_burst(&self) -> UpdaterStats {
        let mut stats = UpdaterStats::default();

        for _ in 0..self.settings.puts_per_burst {
            let (key, value) = {
                let mut rng = rand::thread_rng();
                let key = rng.gen_range(0..self.settings.key_space.max(1));
                let value = rng.gen_range(0..5000) + rng.gen_range(0..10_000);
                (key, value)
            };

            match self.cache.put(key, value).await {
                Ok(()) => stats.puts += 1,
                Err(e) => {
                    stats.errors += 1;
                    tracing::warn!("put({}) failed: {}", key, e);
                }
            }
        }

        stats
    }

    pub async fn get_burst(&self) -> UpdaterStats {
        let mut stats = UpdaterStats::default();

        for _ in 0..self.settings.gets_per_burst {
            let key = rand::thread_rng().gen_range(0..self.settings.key_space.max(1));

            match self.cache.get(key).await {
                Ok(found) => {
                    stats.gets += 1;
                    if found.is_some() {
                        stats.hits += 1;
                    }
                }
                Err(e) => {
                    stats.errors += 1;
                    tracing::warn!("get({}) failed: {}", key, e);
                }
            }
        }

        stats
    }
}

fn merge(totals: &mut UpdaterStats, stats: &UpdaterStats) {
    totals.puts += stats.puts;
    totals.gets += stats.gets;
    totals.hits += stats.hits;
    totals.errors += stats.errors;
}

/// Sleeps for `duration`; returns `false` if cancelled first.
pub(crate) async fn park(duration: Duration, shutdown: &CancellationToken) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

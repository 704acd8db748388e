//! Result aggregation and periodic refresh

use crate::Result;
use crate::store::{DocumentStore, StoreAdapter};
use crate::types::ElectionResults;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Reads every candidate and totals their counters
///
/// This is a plain read with no transaction, so it never contends with
/// in-flight votes.
pub struct ResultsAggregator<S> {
    adapter: StoreAdapter<S>,
}

impl<S: DocumentStore> ResultsAggregator<S> {
    pub fn new(adapter: StoreAdapter<S>) -> Self {
        Self { adapter }
    }

    pub async fn get_results(&self) -> Result<ElectionResults> {
        let candidates = self.adapter.list_candidates().await?;
        let results = ElectionResults::from_candidates(candidates);

        tracing::debug!(
            "📊 Results read: {} candidates, {} votes",
            results.candidates.len(),
            results.total_votes
        );
        Ok(results)
    }
}

/// Background task that refreshes results on a fixed interval
///
/// Each successful read is published on a `watch` channel. A failed read is
/// logged and the previous snapshot stays published.
pub struct ResultsPoller<S> {
    aggregator: Arc<ResultsAggregator<S>>,
    refresh_interval: Duration,
    stop_signal: mpsc::Receiver<()>,
    publisher: watch::Sender<Option<ElectionResults>>,
}

impl<S: DocumentStore> ResultsPoller<S> {
    /// Create the poller and the receiver its snapshots are published on
    pub fn new(
        aggregator: Arc<ResultsAggregator<S>>,
        refresh_interval: Duration,
        stop_signal: mpsc::Receiver<()>,
    ) -> (Self, watch::Receiver<Option<ElectionResults>>) {
        let (publisher, receiver) = watch::channel(None);
        let refresh_interval = if refresh_interval.is_zero() {
            Duration::from_secs(1)
        } else {
            refresh_interval
        };

        let poller = Self {
            aggregator,
            refresh_interval,
            stop_signal,
            publisher,
        };
        (poller, receiver)
    }

    /// Poll until the stop signal fires or its sender is dropped
    ///
    /// The first refresh happens immediately.
    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(self.refresh_interval);

        tracing::info!(
            "📡 Results poller started (interval: {:?})",
            self.refresh_interval
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.aggregator.get_results().await {
                        Ok(results) => {
                            self.publisher.send_replace(Some(results));
                        }
                        Err(e) => tracing::error!("❌ Results refresh failed: {}", e),
                    }
                }
                _ = self.stop_signal.recv() => {
                    tracing::info!("🛑 Results poller stopping");
                    break;
                }
            }
        }

        tracing::info!("✅ Results poller stopped");
    }
}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use logscope_types::StatsSnapshot;

/// Seam for the aggregate-fetch endpoint
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Fetch server-aggregated statistics over the trailing window
    async fn fetch_stats(&self, window_seconds: u64) -> anyhow::Result<StatsSnapshot>;
}

struct CellInner {
    snapshot: Option<StatsSnapshot>,
    closed: bool,
}

/// Shared slot holding the latest statistics snapshot.
///
/// Snapshots are replaced whole, never merged. Once the owning poller has
/// stopped, the cell is closed and late fetch responses are discarded.
#[derive(Clone)]
pub struct StatsCell {
    inner: Arc<RwLock<CellInner>>,
}

impl StatsCell {
    fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(CellInner {
                snapshot: None,
                closed: false,
            })),
        }
    }

    /// Latest snapshot, if any poll has succeeded yet
    pub fn get(&self) -> Option<StatsSnapshot> {
        self.inner.read().snapshot.clone()
    }

    /// Replace the snapshot. Returns false if the cell is closed; the
    /// closed check and the write happen under one lock, so nothing can
    /// land after `stop` has returned.
    fn store(&self, snapshot: StatsSnapshot) -> bool {
        let mut inner = self.inner.write();
        if inner.closed {
            return false;
        }
        inner.snapshot = Some(snapshot);
        true
    }

    fn close(&self) {
        self.inner.write().closed = true;
    }
}

/// Periodically fetches aggregate statistics, independent of the event
/// stream.
///
/// The first fetch fires immediately so the chart never starts blank.
/// Overlapping fetches are allowed to proceed; whichever response resolves
/// last wins. A failed fetch keeps the previous snapshot (stale beats
/// blank) and nothing retries before the next scheduled tick.
pub struct StatsPoller {
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
    cell: StatsCell,
}

impl StatsPoller {
    /// Spawn the poll task
    pub fn start(source: Arc<dyn StatsSource>, interval: Duration, window_seconds: u64) -> Self {
        let cancel = CancellationToken::new();
        let cell = StatsCell::new();

        let task = tokio::spawn(run_poller(
            source,
            interval,
            window_seconds,
            cancel.clone(),
            cell.clone(),
        ));

        Self { cancel, task, cell }
    }

    /// Handle to the snapshot slot (cheap to clone)
    pub fn cell(&self) -> StatsCell {
        self.cell.clone()
    }

    /// Stop polling. Idempotent; after this returns, no further snapshot
    /// replacement occurs, even from fetches still in flight.
    pub fn stop(&self) {
        self.cell.close();
        self.cancel.cancel();
        self.task.abort();
    }
}

impl Drop for StatsPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_poller(
    source: Arc<dyn StatsSource>,
    interval: Duration,
    window_seconds: u64,
    cancel: CancellationToken,
    cell: StatsCell,
) {
    // The first tick of a tokio interval completes immediately.
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            _ = ticker.tick() => {
                // Each fetch runs independently; a slow response must not
                // delay the next tick.
                let source = Arc::clone(&source);
                let cell = cell.clone();
                tokio::spawn(async move {
                    match source.fetch_stats(window_seconds).await {
                        Ok(snapshot) => {
                            if !cell.store(snapshot) {
                                debug!("poller stopped, discarding late stats response");
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "stats fetch failed, keeping previous snapshot");
                        }
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Notify;

    fn snapshot(info: u64) -> StatsSnapshot {
        let mut per_level = BTreeMap::new();
        per_level.insert("INFO".to_string(), info);
        StatsSnapshot {
            per_level,
            average_per_second: 1.0,
            error_rate: 0.0,
        }
    }

    /// Source that succeeds once, then fails forever
    struct FlakySource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StatsSource for FlakySource {
        async fn fetch_stats(&self, _window_seconds: u64) -> anyhow::Result<StatsSnapshot> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                Ok(snapshot(42))
            } else {
                anyhow::bail!("aggregation service unavailable")
            }
        }
    }

    /// Source that blocks until released, then returns a snapshot
    struct GatedSource {
        gate: Notify,
        started: Notify,
    }

    #[async_trait]
    impl StatsSource for GatedSource {
        async fn fetch_stats(&self, _window_seconds: u64) -> anyhow::Result<StatsSnapshot> {
            self.started.notify_one();
            self.gate.notified().await;
            Ok(snapshot(99))
        }
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn test_first_fetch_fires_immediately() {
        let source = Arc::new(FlakySource {
            calls: AtomicUsize::new(0),
        });
        // Long interval: any snapshot present must come from the immediate
        // first tick.
        let poller = StatsPoller::start(source, Duration::from_secs(300), 60);
        let cell = poller.cell();

        wait_for(|| cell.get().is_some()).await;
        assert_eq!(cell.get().unwrap().per_level.get("INFO"), Some(&42));

        poller.stop();
    }

    #[tokio::test]
    async fn test_failed_fetch_retains_previous_snapshot() {
        let source = Arc::new(FlakySource {
            calls: AtomicUsize::new(0),
        });
        let poller = StatsPoller::start(Arc::clone(&source) as Arc<dyn StatsSource>, Duration::from_millis(10), 60);
        let cell = poller.cell();

        wait_for(|| cell.get().is_some()).await;
        // Let several failing polls go by
        wait_for(|| source.calls.load(Ordering::SeqCst) >= 3).await;

        let current = cell.get().unwrap();
        assert_eq!(current, snapshot(42));

        poller.stop();
    }

    #[tokio::test]
    async fn test_no_replacement_after_stop() {
        let source = Arc::new(GatedSource {
            gate: Notify::new(),
            started: Notify::new(),
        });
        let poller = StatsPoller::start(Arc::clone(&source) as Arc<dyn StatsSource>, Duration::from_secs(300), 60);
        let cell = poller.cell();

        // Wait until the in-flight fetch has started, then stop while it
        // is still suspended.
        source.started.notified().await;
        poller.stop();

        // Release the fetch; its response must be discarded.
        source.gate.notify_one();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(cell.get().is_none());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let source = Arc::new(FlakySource {
            calls: AtomicUsize::new(0),
        });
        let poller = StatsPoller::start(source, Duration::from_secs(300), 60);
        let cell = poller.cell();

        wait_for(|| cell.get().is_some()).await;
        poller.stop();
        poller.stop();
        assert_eq!(cell.get(), Some(snapshot(42)));
    }
}

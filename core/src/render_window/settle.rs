use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::render::AssetLoad;

/// Counts of the asset loads a settle cycle waited for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettleReport {
    pub loaded: usize,
    pub failed: usize,
}

/// Waits for the asset loads started by one window rebuild.
///
/// Each cycle is independent: a later rebuild creates a new cycle and never
/// cancels an earlier one. Nothing times out, so a load that never completes
/// only delays the settle callback.
#[derive(Debug, Default)]
pub struct SettleCycle {
    loads: Vec<AssetLoad>,
}

impl SettleCycle {
    pub fn new(loads: Vec<AssetLoad>) -> Self {
        Self { loads }
    }

    pub fn pending(&self) -> usize {
        self.loads.len()
    }

    /// Resolves once every load finished, successfully or not. Completes
    /// immediately when there is nothing to wait for.
    pub async fn wait(self) -> SettleReport {
        let mut report = SettleReport::default();
        let mut remaining = self.loads.len();
        let mut loads: FuturesUnordered<_> = self.loads.into_iter().map(AssetLoad::wait).collect();
        while let Some(result) = loads.next().await {
            remaining -= 1;
            match result {
                Ok(()) => report.loaded += 1,
                Err(err) => {
                    debug!(error = %err, remaining, "asset load failed");
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Runs `on_settled` (typically scroll-to-end) on the runtime once the
    /// cycle settles.
    pub fn spawn<F>(self, on_settled: F) -> JoinHandle<()>
    where
        F: FnOnce(SettleReport) + Send + 'static,
    {
        tokio::spawn(async move {
            let report = self.wait().await;
            debug!(loaded = report.loaded, failed = report.failed, "render settled");
            on_settled(report);
        })
    }
}

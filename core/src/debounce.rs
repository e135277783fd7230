//! Trailing-edge debouncing of deferred host work.
//!
//! [`DebouncedRequester`] is a cheap, cloneable handle. Its scheduler task
//! collapses a burst of requests into one notification, sent once `delay` has
//! passed since the most recent request. The host's event loop owns the log
//! and the helper, so it receives the notification and does the work itself:
//! a full check, or flushing queued config writes.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Handle side of the requester/scheduler pair.
#[derive(Clone, Debug)]
pub struct DebouncedRequester {
    request_tx: mpsc::UnboundedSender<Instant>,
}

impl DebouncedRequester {
    /// Spawns the scheduler on the current runtime. Notifications go to
    /// `notify_tx`.
    pub fn new(delay: Duration, notify_tx: broadcast::Sender<()>) -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let scheduler = DebounceScheduler {
            receiver: request_rx,
            notify_tx,
            delay,
        };
        tokio::spawn(scheduler.run());
        Self { request_tx }
    }

    /// Asks for a notification, pushing any pending one back by the delay.
    pub fn request(&self) {
        let _ = self.request_tx.send(Instant::now());
    }
}

struct DebounceScheduler {
    receiver: mpsc::UnboundedReceiver<Instant>,
    notify_tx: broadcast::Sender<()>,
    delay: Duration,
}

impl DebounceScheduler {
    /// Runs until every requester is dropped.
    async fn run(mut self) {
        const ONE_YEAR: Duration = Duration::from_secs(60 * 60 * 24 * 365);
        let mut next_deadline: Option<Instant> = None;
        loop {
            let target = next_deadline.unwrap_or_else(|| Instant::now() + ONE_YEAR);
            let deadline = tokio::time::sleep_until(target);
            tokio::pin!(deadline);

            tokio::select! {
                // Drain queued requests before honoring an elapsed deadline.
                biased;

                requested_at = self.receiver.recv() => {
                    let Some(requested_at) = requested_at else {
                        break
                    };
                    // Trailing edge: every request restarts the quiet period.
                    let due = requested_at + self.delay;
                    next_deadline = Some(next_deadline.map_or(due, |current| current.max(due)));
                    continue;
                }
                _ = &mut deadline => {
                    if next_deadline.take().is_some() {
                        let _ = self.notify_tx.send(());
                    }
                }
            }
        }
    }
}

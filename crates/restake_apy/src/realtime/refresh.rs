//! Periodic realtime APY refresh on a tokio interval.

use crate::realtime::engine::{ApyEngine, ApySnapshot};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Running refresh task. Dropping the handle stops the task.
pub struct RefreshHandle {
    task: JoinHandle<()>,
    rx: watch::Receiver<ApySnapshot>,
}

impl RefreshHandle {
    pub fn subscribe(&self) -> watch::Receiver<ApySnapshot> {
        self.rx.clone()
    }

    pub fn latest(&self) -> ApySnapshot {
        self.rx.borrow().clone()
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Recompute realtime APY for `ids` immediately and then every `period`.
/// Must be called from within a tokio runtime.
pub fn spawn_refresh(engine: Arc<ApyEngine>, ids: Vec<String>, period: Duration) -> RefreshHandle {
    let (tx, rx) = watch::channel(ApySnapshot::default());
    let period = period.max(Duration::from_millis(1));
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sequence = 0u64;
        loop {
            ticker.tick().await;
            sequence += 1;
            let snapshot = engine.realtime_snapshot(&ids, sequence).await;
            debug!(sequence, protocols = snapshot.apys.len(), "apy refresh");
            if tx.send(snapshot).is_err() {
                break;
            }
        }
    });
    RefreshHandle { task, rx }
}

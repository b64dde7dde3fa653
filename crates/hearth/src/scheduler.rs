//! Periodic fireboard refresh.

use hearth_social::FireboardEngine;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Run `task` every `period`, starting one period from now.
///
/// Ticks missed while a run is still going are skipped rather than bunched.
pub fn spawn_periodic<F, Fut>(period: Duration, mut task: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            debug!("Periodic task tick");
            task().await;
        }
    })
}

/// Refresh every fireboard entry on a fixed interval.
pub fn spawn_refresh(engine: Arc<FireboardEngine>, period: Duration) -> JoinHandle<()> {
    info!(minutes = period.as_secs() / 60, "Scheduling periodic fireboard refresh");
    spawn_periodic(period, move || {
        let engine = Arc::clone(&engine);
        async move {
            let summary = engine.refresh_all_entries().await;
            info!(%summary, "Periodic refresh finished");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_runs_once_per_period() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let handle = spawn_periodic(Duration::from_secs(60), move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        handle.abort();
    }
}

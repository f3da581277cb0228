//! Factory functions for recurring background tasks
//!
//! Tasks are plain closures returning a boxed future so the same closure
//! can be run by [`spawn_periodic_task`] or invoked directly in tests.

use std::time::Duration;

use application::services::DraftAutosaveService;
use futures::future::BoxFuture;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, error, info};

/// Task name for the stale draft cleanup
pub const DRAFT_CLEANUP_TASK: &str = "draft_cleanup";

/// Create a draft cleanup task closure
///
/// Each run removes drafts older than `max_age_days`. The store is
/// synchronous, so the cleanup runs on the blocking pool.
pub fn create_draft_cleanup_task(
    service: DraftAutosaveService,
    max_age_days: u32,
) -> impl Fn() -> BoxFuture<'static, Result<(), String>> + Send + Sync + 'static {
    move || {
        let service = service.clone();

        Box::pin(async move {
            debug!(max_age_days, "Checking for stale drafts");

            match tokio::task::spawn_blocking(move || service.cleanup_older_than(max_age_days))
                .await
            {
                Ok(0) => {
                    debug!("No stale drafts to remove");
                    Ok(())
                },
                Ok(removed) => {
                    info!(removed, max_age_days, "Stale drafts removed");
                    Ok(())
                },
                Err(e) => {
                    error!(error = %e, "Draft cleanup did not complete");
                    Err(format!("Draft cleanup failed: {e}"))
                },
            }
        })
    }
}

/// Run `task` immediately and then every `interval` until the handle is aborted
///
/// Ticks missed while a run is still in progress are skipped. Failed runs
/// are logged and do not stop the schedule.
pub fn spawn_periodic_task<F>(name: &'static str, interval: Duration, task: F) -> JoinHandle<()>
where
    F: Fn() -> BoxFuture<'static, Result<(), String>> + Send + Sync + 'static,
{
    info!(task = name, interval_secs = interval.as_secs(), "Scheduling periodic task");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            debug!(task = name, "Running periodic task");
            if let Err(e) = task().await {
                error!(task = name, error = %e, "Periodic task failed");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use application::ports::{ClockPort, KeyValueStorePort};
    use chrono::{DateTime, TimeZone, Utc};
    use domain::{DraftId, InvoicePayload};
    use parking_lot::Mutex;

    use super::*;
    use crate::storage::InMemoryKeyValueStore;

    struct SettableClock(Mutex<DateTime<Utc>>);

    impl ClockPort for SettableClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock()
        }
    }

    fn service_with_clock() -> (DraftAutosaveService, Arc<SettableClock>) {
        let clock = Arc::new(SettableClock(Mutex::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        )));
        let store: Arc<dyn KeyValueStorePort> = Arc::new(InMemoryKeyValueStore::new());
        let service = DraftAutosaveService::new(store, Arc::clone(&clock) as Arc<dyn ClockPort>);
        (service, clock)
    }

    #[tokio::test]
    async fn cleanup_task_removes_stale_drafts() {
        let (service, clock) = service_with_clock();
        let old = DraftId::new("old").unwrap();
        service.save_now(&old, InvoicePayload::new().with_client("C1"), 10);

        *clock.0.lock() += chrono::Duration::days(8);
        let fresh = DraftId::new("fresh").unwrap();
        service.save_now(&fresh, InvoicePayload::new().with_client("C2"), 10);

        let task = create_draft_cleanup_task(service.clone(), 7);
        assert!(task().await.is_ok());

        assert!(!service.has_draft(&old));
        assert!(service.has_draft(&fresh));
    }

    #[tokio::test]
    async fn cleanup_task_with_nothing_stale_is_ok() {
        let (service, _) = service_with_clock();
        let task = create_draft_cleanup_task(service.clone(), 7);
        assert!(task().await.is_ok());
        assert!(service.list_drafts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_task_runs_on_interval_and_survives_failures() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);

        let handle = spawn_periodic_task("test", Duration::from_secs(60), move || {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err("always fails".to_string())
            })
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        handle.abort();
    }
}

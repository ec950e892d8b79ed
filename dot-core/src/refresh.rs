//! Debounced live mirror of host data for display.
//!
//! Independent of generation: the orchestrator always pulls a fresh snapshot
//! itself. At most one refresh is pending at any time.

use crate::host::{HostValue, Selector};
use crate::sanitize::sanitize_data;
use crate::types::DotData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

/// Sanitized copy of host data, refreshed after a quiet period.
pub struct LiveData {
    selector: Selector,
    debounce: Duration,
    tx: Arc<watch::Sender<DotData>>,
    pending: Option<JoinHandle<()>>,
}

impl LiveData {
    /// Sample the selector once, immediately.
    pub fn new<F>(selector: F, debounce: Duration) -> Self
    where
        F: Fn() -> HostValue + Send + Sync + 'static,
    {
        Self::with_selector(Arc::new(selector), debounce)
    }

    pub fn with_selector(selector: Selector, debounce: Duration) -> Self {
        let (tx, _rx) = watch::channel(sample(&selector));
        Self {
            selector,
            debounce,
            tx: Arc::new(tx),
            pending: None,
        }
    }

    /// The most recent sanitized mapping.
    pub fn current(&self) -> DotData {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every refresh.
    pub fn subscribe(&self) -> watch::Receiver<DotData> {
        self.tx.subscribe()
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Restart the debounce window. Any pending refresh is cancelled first.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule_refresh(&mut self) {
        self.cancel();

        let selector = Arc::clone(&self.selector);
        let tx = Arc::clone(&self.tx);
        let debounce = self.debounce;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            tx.send_replace(sample(&selector));
            tracing::trace!("Live data refreshed");
        }));
    }

    /// Cancel any pending refresh and sample right away.
    pub fn refresh_now(&mut self) {
        self.cancel();
        self.tx.send_replace(sample(&self.selector));
    }

    pub fn has_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for LiveData {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn sample(selector: &Selector) -> DotData {
    sanitize_data(&selector())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

    struct Source {
        value: AtomicI64,
        reads: AtomicUsize,
    }

    fn live(debounce_ms: u64) -> (LiveData, Arc<Source>) {
        let source = Arc::new(Source {
            value: AtomicI64::new(1),
            reads: AtomicUsize::new(0),
        });
        let s = Arc::clone(&source);
        let live = LiveData::new(
            move || {
                s.reads.fetch_add(1, Ordering::SeqCst);
                HostValue::object([("count", HostValue::from(s.value.load(Ordering::SeqCst)))])
            },
            Duration::from_millis(debounce_ms),
        );
        (live, source)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_sample_is_immediate() {
        let (live, source) = live(400);
        assert_eq!(live.current()["count"], json!(1));
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
        assert!(!live.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_waits_for_debounce() {
        let (mut live, source) = live(400);
        source.value.store(2, Ordering::SeqCst);

        live.schedule_refresh();
        assert!(live.has_pending());

        tokio::time::sleep(ms(399)).await;
        assert_eq!(live.current()["count"], json!(1));

        tokio::time::sleep(ms(2)).await;
        assert_eq!(live.current()["count"], json!(2));
        assert!(!live.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescheduling_restarts_the_window() {
        let (mut live, source) = live(400);
        source.value.store(5, Ordering::SeqCst);

        live.schedule_refresh();
        tokio::time::sleep(ms(300)).await;
        live.schedule_refresh();
        tokio::time::sleep(ms(300)).await;
        assert_eq!(live.current()["count"], json!(1));

        tokio::time::sleep(ms(101)).await;
        assert_eq!(live.current()["count"], json!(5));
        assert_eq!(source.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_refresh() {
        let (mut live, source) = live(400);
        source.value.store(9, Ordering::SeqCst);

        live.schedule_refresh();
        live.cancel();
        tokio::time::sleep(ms(1000)).await;

        assert!(!live.has_pending());
        assert_eq!(live.current()["count"], json!(1));
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_pending_refresh() {
        let (mut live, source) = live(400);
        live.schedule_refresh();
        drop(live);
        tokio::time::sleep(ms(1000)).await;
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_refresh() {
        let (mut live, source) = live(10);
        let mut rx = live.subscribe();
        source.value.store(3, Ordering::SeqCst);

        live.schedule_refresh();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow()["count"], json!(3));

        source.value.store(4, Ordering::SeqCst);
        live.refresh_now();
        assert_eq!(live.current()["count"], json!(4));
    }
}

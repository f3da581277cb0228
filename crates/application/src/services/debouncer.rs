//! Keyed debounce timers
//!
//! Each key owns at most one pending task. Arming a key again aborts the
//! previous task and restarts the delay, so only the most recent request in
//! a quiet period ever runs.
//!
//! A fired task receives a [`Ticket`] and must [`Debouncer::claim`] it before
//! acting: the claim fails if the key was re-armed or cancelled after the
//! task woke up. Callers that need cancellation to be ordered with other work
//! take their own lock before claiming.

use std::{collections::HashMap, fmt, hash::Hash, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, warn};

/// Proof that a fired task was the current one for its key when it woke
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<K> {
    key: K,
    generation: u64,
}

impl<K> Ticket<K> {
    /// Key the task was armed for
    pub const fn key(&self) -> &K {
        &self.key
    }
}

struct Pending {
    generation: u64,
    handle: JoinHandle<()>,
}

struct DebounceState<K> {
    next_generation: u64,
    pending: HashMap<K, Pending>,
}

/// Per-key cancellable delayed tasks on the Tokio runtime
pub struct Debouncer<K> {
    state: Arc<Mutex<DebounceState<K>>>,
}

impl<K> fmt::Debug for Debouncer<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("pending", &self.state.lock().pending.len())
            .finish()
    }
}

impl<K> Default for Debouncer<K> {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(DebounceState {
                next_generation: 0,
                pending: HashMap::new(),
            })),
        }
    }
}

impl<K> Drop for Debouncer<K> {
    fn drop(&mut self) {
        for pending in self.state.lock().pending.values() {
            pending.handle.abort();
        }
    }
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + 'static,
{
    /// Create a debouncer with no pending tasks
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay` unless `key` is re-armed or cancelled first
    ///
    /// Any task already pending for `key` is aborted. Returns `false` when
    /// called outside a Tokio runtime; nothing is scheduled in that case.
    pub fn arm<F>(&self, key: K, delay: Duration, task: F) -> bool
    where
        F: FnOnce(Ticket<K>) + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            warn!(key = ?key, "No async runtime available, cannot schedule task");
            return false;
        };

        let mut state = self.state.lock();
        state.next_generation += 1;
        let ticket = Ticket {
            key: key.clone(),
            generation: state.next_generation,
        };
        let generation = ticket.generation;

        let shared = Arc::clone(&self.state);
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let done = ticket.clone();
            task(ticket);
            Self::release(&shared, &done);
        });

        if let Some(previous) = state.pending.insert(key.clone(), Pending { generation, handle }) {
            previous.handle.abort();
            debug!(key = ?key, "Restarted pending task");
        }
        true
    }

    /// Take ownership of a fired task's slot
    ///
    /// Returns `true` only if `ticket` is still the latest one armed for its
    /// key; the slot is then cleared so the key can be armed afresh.
    pub fn claim(&self, ticket: &Ticket<K>) -> bool {
        Self::release(&self.state, ticket)
    }

    /// Abort the pending task for `key`
    pub fn cancel(&self, key: &K) -> bool {
        self.state.lock().pending.remove(key).is_some_and(|pending| {
            pending.handle.abort();
            true
        })
    }

    /// Abort every pending task; returns how many were cancelled
    pub fn cancel_all(&self) -> usize {
        let mut state = self.state.lock();
        let count = state.pending.len();
        for (_, pending) in state.pending.drain() {
            pending.handle.abort();
        }
        count
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.state.lock().pending.contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    fn release(state: &Mutex<DebounceState<K>>, ticket: &Ticket<K>) -> bool {
        let mut state = state.lock();
        match state.pending.get(&ticket.key) {
            Some(pending) if pending.generation == ticket.generation => {
                state.pending.remove(&ticket.key);
                true
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<(String, u32)>>>, Arc<AtomicUsize>) {
        (Arc::new(Mutex::new(Vec::new())), Arc::new(AtomicUsize::new(0)))
    }

    fn arm_recording(
        debouncer: &Arc<Debouncer<String>>,
        key: &str,
        value: u32,
        delay_ms: u64,
        fired: &Arc<Mutex<Vec<(String, u32)>>>,
    ) -> bool {
        let fired = Arc::clone(fired);
        let owner = Arc::clone(debouncer);
        debouncer.arm(key.to_string(), Duration::from_millis(delay_ms), move |ticket| {
            if owner.claim(&ticket) {
                fired.lock().push((ticket.key().clone(), value));
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let debouncer = Arc::new(Debouncer::new());
        let (fired, _) = recorder();

        assert!(arm_recording(&debouncer, "a", 1, 100, &fired));
        assert!(debouncer.is_pending(&"a".to_string()));

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert!(fired.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(*fired.lock(), vec![("a".to_string(), 1)]);
        assert_eq!(debouncer.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_restarts_delay_and_keeps_latest_value() {
        let debouncer = Arc::new(Debouncer::new());
        let (fired, _) = recorder();

        arm_recording(&debouncer, "a", 1, 100, &fired);
        tokio::time::sleep(Duration::from_millis(60)).await;
        arm_recording(&debouncer, "a", 2, 100, &fired);
        assert_eq!(debouncer.pending_count(), 1);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(fired.lock().is_empty(), "first task must have been superseded");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*fired.lock(), vec![("a".to_string(), 2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_independent() {
        let debouncer = Arc::new(Debouncer::new());
        let (fired, _) = recorder();

        arm_recording(&debouncer, "a", 1, 100, &fired);
        arm_recording(&debouncer, "b", 2, 50, &fired);
        assert_eq!(debouncer.pending_count(), 2);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(
            *fired.lock(),
            vec![("b".to_string(), 2), ("a".to_string(), 1)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let debouncer = Arc::new(Debouncer::new());
        let (fired, _) = recorder();

        arm_recording(&debouncer, "a", 1, 100, &fired);
        assert!(debouncer.cancel(&"a".to_string()));
        assert!(!debouncer.cancel(&"a".to_string()));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(fired.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_reports_count() {
        let debouncer = Arc::new(Debouncer::new());
        let (fired, _) = recorder();

        arm_recording(&debouncer, "a", 1, 100, &fired);
        arm_recording(&debouncer, "b", 2, 100, &fired);
        assert_eq!(debouncer.cancel_all(), 2);
        assert_eq!(debouncer.pending_count(), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(fired.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unclaimed_task_still_frees_its_slot() {
        let debouncer: Debouncer<String> = Debouncer::new();
        let (_, runs) = recorder();
        let counter = Arc::clone(&runs);

        debouncer.arm("a".to_string(), Duration::from_millis(10), move |_ticket| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending(&"a".to_string()));
    }

    #[tokio::test]
    async fn stale_ticket_cannot_be_claimed() {
        let debouncer: Debouncer<String> = Debouncer::new();
        debouncer.arm("a".to_string(), Duration::from_secs(60), |_| {});
        debouncer.arm("a".to_string(), Duration::from_secs(60), |_| {});

        let stale = Ticket {
            key: "a".to_string(),
            generation: 1,
        };
        let current = Ticket {
            key: "a".to_string(),
            generation: 2,
        };
        assert!(!debouncer.claim(&stale));
        assert!(debouncer.claim(&current));
        assert!(!debouncer.claim(&current));
    }

    #[test]
    fn arming_outside_runtime_is_rejected() {
        let debouncer: Debouncer<String> = Debouncer::new();
        assert!(!debouncer.arm("a".to_string(), Duration::from_millis(1), |_| {}));
        assert_eq!(debouncer.pending_count(), 0);
    }
}

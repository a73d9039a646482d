//! Join-debounced batch scheduling
//!
//! Coalesces bursts of "user joined" signals into a single delayed pass over
//! the registered fix-up actions. The delay is fixed from the join that
//! opened the window: later joins in the same window do not push the batch
//! back.

use crate::timer::{Timer, TokioTimer};
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use sync_core::{Action, ActionRegistry, Handle, SyncConfig, SyncError};
use tracing::{debug, info, warn};

/// Counters describing scheduler activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Total calls to `signal_join`
    pub joins_signaled: u64,
    /// Joins absorbed into an already pending batch
    pub joins_coalesced: u64,
    /// Batches executed
    pub batches_run: u64,
    /// Action invocations across all batches
    pub actions_run: u64,
    /// Action invocations that returned an error or panicked
    pub action_failures: u64,
}

/// Outcome of a single batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    /// Sequence number of the batch, starting at 1
    pub batch: u64,
    /// Actions invoked
    pub ran: usize,
    /// Actions that failed
    pub failed: usize,
}

/// State shared between scheduler clones and pending timer callbacks
struct Inner {
    min_interval: Duration,
    registry: Mutex<ActionRegistry>,
    /// Set while a batch is armed and not yet started
    pending: AtomicBool,
    joins_signaled: AtomicU64,
    joins_coalesced: AtomicU64,
    batches_run: AtomicU64,
    actions_run: AtomicU64,
    action_failures: AtomicU64,
    last_report: Mutex<Option<BatchReport>>,
}

impl Inner {
    /// Run every action registered when the batch starts
    fn run_batch(&self) -> BatchReport {
        // Clear first so a join arriving mid-batch arms the next batch
        self.pending.store(false, Ordering::SeqCst);

        let snapshot = self.registry.lock().snapshot();
        let batch = self.batches_run.fetch_add(1, Ordering::SeqCst) + 1;

        let mut failed = 0;
        for (handle, action) in &snapshot {
            if let Err(reason) = invoke(action.as_ref()) {
                failed += 1;
                warn!(
                    "Sync action {} ({}) failed in batch {}: {}",
                    handle,
                    action.name(),
                    batch,
                    reason
                );
            }
        }

        self.actions_run
            .fetch_add(snapshot.len() as u64, Ordering::SeqCst);
        self.action_failures
            .fetch_add(failed as u64, Ordering::SeqCst);

        let report = BatchReport {
            batch,
            ran: snapshot.len(),
            failed,
        };
        *self.last_report.lock() = Some(report);

        info!(
            "Sync batch {} ran {} actions ({} failed)",
            batch, report.ran, report.failed
        );
        report
    }
}

/// Run one action, turning both errors and panics into a message
fn invoke(action: &dyn Action) -> Result<(), String> {
    match panic::catch_unwind(AssertUnwindSafe(|| action.run())) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(format!("{:#}", e)),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

/// Join-debounced batch scheduler
///
/// Cloning is cheap and clones share the same registry and pending batch.
/// If every clone is dropped before an armed batch fires, the batch is
/// skipped.
#[derive(Clone)]
pub struct JoinScheduler {
    inner: Arc<Inner>,
    timer: Arc<dyn Timer>,
}

impl JoinScheduler {
    /// Create a scheduler on the current tokio runtime
    pub fn new(min_interval: Duration) -> Result<Self, SyncError> {
        let timer = TokioTimer::current()?;
        Ok(Self::with_timer(min_interval, Arc::new(timer)))
    }

    /// Create a scheduler driven by the given timer
    pub fn with_timer(min_interval: Duration, timer: Arc<dyn Timer>) -> Self {
        Self {
            inner: Arc::new(Inner {
                min_interval,
                registry: Mutex::new(ActionRegistry::new()),
                pending: AtomicBool::new(false),
                joins_signaled: AtomicU64::new(0),
                joins_coalesced: AtomicU64::new(0),
                batches_run: AtomicU64::new(0),
                actions_run: AtomicU64::new(0),
                action_failures: AtomicU64::new(0),
                last_report: Mutex::new(None),
            }),
            timer,
        }
    }

    /// Create a scheduler from validated configuration
    ///
    /// Fails on a negative or out-of-range interval.
    pub fn from_config(config: &SyncConfig, timer: Arc<dyn Timer>) -> Result<Self, SyncError> {
        let min_interval = config.min_interval()?;
        Ok(Self::with_timer(min_interval, timer))
    }

    /// Minimum interval between a window's first join and its batch
    pub fn min_interval(&self) -> Duration {
        self.inner.min_interval
    }

    /// Register an action for every future batch
    pub fn register<A: Action + 'static>(&self, action: A) -> Handle {
        self.register_arc(Arc::new(action))
    }

    /// Register an already shared action
    pub fn register_arc(&self, action: Arc<dyn Action>) -> Handle {
        let handle = self.inner.registry.lock().insert(action);
        debug!("Registered sync action {}", handle);
        handle
    }

    /// Register a closure
    pub fn register_fn<F>(&self, f: F) -> Handle
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(f)
    }

    /// Remove an action
    ///
    /// Returns whether the handle was registered. Unknown handles are ignored.
    pub fn deregister(&self, handle: Handle) -> bool {
        let removed = self.inner.registry.lock().remove(handle).is_some();
        if removed {
            debug!("Deregistered sync action {}", handle);
        }
        removed
    }

    /// Record that a user joined
    ///
    /// Arms a batch `min_interval` from now unless one is already pending,
    /// in which case the join is absorbed. Returns whether this call armed
    /// a batch. Never runs actions on the caller's thread.
    pub fn signal_join(&self) -> bool {
        self.inner.joins_signaled.fetch_add(1, Ordering::SeqCst);

        let armed = self
            .inner
            .pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();

        if !armed {
            self.inner.joins_coalesced.fetch_add(1, Ordering::SeqCst);
            debug!("Join absorbed into pending sync batch");
            return false;
        }

        debug!("Arming sync batch in {:?}", self.inner.min_interval);
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        self.timer.schedule_after(
            self.inner.min_interval,
            Box::new(move || match weak.upgrade() {
                Some(inner) => {
                    inner.run_batch();
                }
                None => debug!("Scheduler dropped before sync batch fired"),
            }),
        );
        true
    }

    /// Whether a batch is armed and has not started yet
    pub fn is_pending(&self) -> bool {
        self.inner.pending.load(Ordering::SeqCst)
    }

    /// Check whether a handle is registered
    pub fn contains(&self, handle: Handle) -> bool {
        self.inner.registry.lock().contains(handle)
    }

    /// Number of registered actions
    pub fn len(&self) -> usize {
        self.inner.registry.lock().len()
    }

    /// Whether no actions are registered
    pub fn is_empty(&self) -> bool {
        self.inner.registry.lock().is_empty()
    }

    /// Report of the most recent batch, if any has run
    pub fn last_report(&self) -> Option<BatchReport> {
        *self.inner.last_report.lock()
    }

    /// Snapshot of activity counters
    pub fn stats(&self) -> SchedulerStats {
        let inner = &self.inner;
        SchedulerStats {
            joins_signaled: inner.joins_signaled.load(Ordering::SeqCst),
            joins_coalesced: inner.joins_coalesced.load(Ordering::SeqCst),
            batches_run: inner.batches_run.load(Ordering::SeqCst),
            actions_run: inner.actions_run.load(Ordering::SeqCst),
            action_failures: inner.action_failures.load(Ordering::SeqCst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualTimer;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::sync::atomic::AtomicUsize;

    const INTERVAL: Duration = Duration::from_millis(5000);

    fn manual() -> (Arc<ManualTimer>, JoinScheduler) {
        let timer = Arc::new(ManualTimer::new());
        let scheduler = JoinScheduler::with_timer(INTERVAL, timer.clone());
        (timer, scheduler)
    }

    fn counter(scheduler: &JoinScheduler) -> (Arc<AtomicUsize>, Handle) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let handle = scheduler.register_fn(move || {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        (count, handle)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_burst_of_joins_runs_one_batch() {
        let (timer, scheduler) = manual();
        let (count, _) = counter(&scheduler);

        assert!(scheduler.signal_join());
        for _ in 0..50 {
            assert!(!scheduler.signal_join());
        }

        timer.advance(INTERVAL * 3);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let stats = scheduler.stats();
        assert_eq!(stats.joins_signaled, 51);
        assert_eq!(stats.joins_coalesced, 50);
        assert_eq!(stats.batches_run, 1);
    }

    #[test]
    fn test_fixed_delay_from_first_join() {
        let (timer, scheduler) = manual();
        let (count, _) = counter(&scheduler);

        // Joins at t=0, 1000, 4000; the batch fires at t=5000
        scheduler.signal_join();
        timer.advance_to(ms(1000));
        scheduler.signal_join();
        timer.advance_to(ms(4000));
        scheduler.signal_join();

        timer.advance_to(ms(4999));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(scheduler.is_pending());

        timer.advance_to(ms(5000));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_pending());

        // Later joins in the first window did not arm another batch
        timer.advance_to(ms(20_000));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_joins_arm_exactly_once() {
        const THREADS: usize = 16;
        let (timer, scheduler) = manual();
        let (count, _) = counter(&scheduler);
        let barrier = Arc::new(std::sync::Barrier::new(THREADS));

        let workers: Vec<_> = (0..THREADS)
            .map(|_| {
                let scheduler = scheduler.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    scheduler.signal_join()
                })
            })
            .collect();

        let armed = workers
            .into_iter()
            .map(|worker| worker.join().unwrap())
            .filter(|armed| *armed)
            .count();

        assert_eq!(armed, 1);
        assert_eq!(timer.pending(), 1);
        assert!(scheduler.is_pending());

        timer.advance(INTERVAL);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let stats = scheduler.stats();
        assert_eq!(stats.joins_signaled, THREADS as u64);
        assert_eq!(stats.joins_coalesced, THREADS as u64 - 1);
        assert_eq!(stats.batches_run, 1);
    }

    #[test]
    fn test_signal_join_never_runs_actions_synchronously() {
        let timer = Arc::new(ManualTimer::new());
        let scheduler = JoinScheduler::with_timer(Duration::ZERO, timer.clone());
        let (count, _) = counter(&scheduler);

        scheduler.signal_join();
        assert_eq!(count.load(Ordering::SeqCst), 0);

        timer.advance(Duration::ZERO);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_idle_rearm_after_batch() {
        let (timer, scheduler) = manual();
        let (count, _) = counter(&scheduler);

        scheduler.signal_join();
        timer.advance(INTERVAL);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        assert!(scheduler.signal_join());
        timer.advance(INTERVAL);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.stats().batches_run, 2);
    }

    #[test]
    fn test_deregistered_action_skipped() {
        let (timer, scheduler) = manual();
        let (a, h0) = counter(&scheduler);
        let (b, h1) = counter(&scheduler);
        let (c, h2) = counter(&scheduler);
        assert_eq!((h0.as_u64(), h1.as_u64(), h2.as_u64()), (0, 1, 2));

        assert!(scheduler.deregister(h1));
        scheduler.signal_join();
        timer.advance(INTERVAL);

        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 0);
        assert_eq!(c.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_deregister_unknown_handle_is_noop() {
        let (_timer, scheduler) = manual();
        let (_, h) = counter(&scheduler);

        assert!(!scheduler.deregister(Handle::from_raw(7)));
        assert!(scheduler.deregister(h));
        assert!(!scheduler.deregister(h));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_self_deregistering_action() {
        let (timer, scheduler) = manual();
        let (before, _) = counter(&scheduler);

        let own_handle: Arc<Mutex<Option<Handle>>> = Arc::new(Mutex::new(None));
        let runs = Arc::new(AtomicUsize::new(0));
        let sched = scheduler.clone();
        let slot = Arc::clone(&own_handle);
        let r = Arc::clone(&runs);
        let handle = scheduler.register_fn(move || {
            r.fetch_add(1, Ordering::SeqCst);
            if let Some(h) = *slot.lock() {
                sched.deregister(h);
            }
            Ok(())
        });
        *own_handle.lock() = Some(handle);

        let (after, _) = counter(&scheduler);

        scheduler.signal_join();
        timer.advance(INTERVAL);

        assert_eq!(before.load(Ordering::SeqCst), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(after.load(Ordering::SeqCst), 1);
        assert!(!scheduler.contains(handle));

        // Second batch no longer includes the removed action
        scheduler.signal_join();
        timer.advance(INTERVAL);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(after.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_action_registered_mid_batch_waits_for_next_batch() {
        let (timer, scheduler) = manual();
        let late = Arc::new(AtomicUsize::new(0));

        let sched = scheduler.clone();
        let l = Arc::clone(&late);
        let added = Arc::new(AtomicBool::new(false));
        scheduler.register_fn(move || {
            if !added.swap(true, Ordering::SeqCst) {
                let l = Arc::clone(&l);
                sched.register_fn(move || {
                    l.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                });
            }
            Ok(())
        });

        scheduler.signal_join();
        timer.advance(INTERVAL);
        assert_eq!(late.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.len(), 2);

        scheduler.signal_join();
        timer.advance(INTERVAL);
        assert_eq!(late.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failures_are_isolated() {
        let (timer, scheduler) = manual();
        let (first, _) = counter(&scheduler);
        scheduler.register_fn(|| anyhow::bail!("engine rejected reattach"));
        scheduler.register_fn(|| panic!("action blew up"));
        let (last, _) = counter(&scheduler);

        scheduler.signal_join();
        timer.advance(INTERVAL);

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(last.load(Ordering::SeqCst), 1);
        assert_eq!(
            scheduler.last_report(),
            Some(BatchReport {
                batch: 1,
                ran: 4,
                failed: 2
            })
        );
        assert_eq!(scheduler.stats().action_failures, 2);
    }

    #[test]
    fn test_join_during_batch_arms_new_batch() {
        let (timer, scheduler) = manual();
        let (count, _) = counter(&scheduler);

        let sched = scheduler.clone();
        let armed = Arc::new(AtomicBool::new(false));
        let a = Arc::clone(&armed);
        scheduler.register_fn(move || {
            // Only the first batch re-signals
            if !a.load(Ordering::SeqCst) {
                a.store(sched.signal_join(), Ordering::SeqCst);
            }
            Ok(())
        });

        scheduler.signal_join();
        timer.advance(INTERVAL);
        assert!(armed.load(Ordering::SeqCst));
        assert!(scheduler.is_pending());

        timer.advance(INTERVAL);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dropped_scheduler_skips_batch() {
        let timer = Arc::new(ManualTimer::new());
        let count = Arc::new(AtomicUsize::new(0));
        {
            let scheduler = JoinScheduler::with_timer(INTERVAL, timer.clone());
            let c = Arc::clone(&count);
            scheduler.register_fn(move || {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            scheduler.signal_join();
        }

        assert_eq!(timer.advance(INTERVAL), 1);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_registry_batch() {
        let (timer, scheduler) = manual();
        scheduler.signal_join();
        timer.advance(INTERVAL);

        let report = scheduler.last_report().unwrap();
        assert_eq!(report.ran, 0);
        assert_eq!(report.failed, 0);
    }

    #[test]
    fn test_from_config_rejects_negative_interval() {
        let timer = Arc::new(ManualTimer::new());
        let result = JoinScheduler::from_config(&SyncConfig::with_interval_ms(-1), timer.clone());
        assert!(matches!(result, Err(SyncError::NegativeInterval(-1))));

        let scheduler = JoinScheduler::from_config(&SyncConfig::with_interval_ms(250), timer).unwrap();
        assert_eq!(scheduler.min_interval(), ms(250));
    }

    #[test]
    fn test_random_join_bursts_one_batch_per_window() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
        let (timer, scheduler) = manual();
        let (count, _) = counter(&scheduler);

        let mut now = 0u64;
        let mut window_end: Option<u64> = None;
        let mut expected = 0usize;

        for _ in 0..500 {
            now += rng.gen_range(0..2500);

            // Fire everything due before this join
            if let Some(end) = window_end {
                if end <= now {
                    expected += 1;
                    window_end = None;
                }
            }
            timer.advance_to(ms(now));
            assert_eq!(count.load(Ordering::SeqCst), expected);

            let armed = scheduler.signal_join();
            assert_eq!(armed, window_end.is_none());
            if armed {
                window_end = Some(now + INTERVAL.as_millis() as u64);
            }
        }

        timer.advance(INTERVAL);
        if window_end.is_some() {
            expected += 1;
        }
        assert_eq!(count.load(Ordering::SeqCst), expected);
        assert_eq!(scheduler.stats().batches_run as usize, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_fires_after_interval() {
        let scheduler = JoinScheduler::new(INTERVAL).unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        scheduler.register_fn(move || {
            tx.send(tokio::time::Instant::now())
                .map_err(|_| anyhow::anyhow!("receiver dropped"))
        });

        let start = tokio::time::Instant::now();
        scheduler.signal_join();
        tokio::time::sleep(ms(1000)).await;
        scheduler.signal_join();
        tokio::time::sleep(ms(3000)).await;
        scheduler.signal_join();

        let fired_at = rx.recv().await.unwrap();
        assert!(fired_at - start >= INTERVAL);
        assert!(fired_at - start < INTERVAL + ms(100));

        tokio::time::sleep(INTERVAL * 2).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(scheduler.stats().batches_run, 1);
    }
}

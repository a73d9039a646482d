//! Timer service used to fire batches
//!
//! The scheduler never sleeps itself: it hands a one-shot callback to a
//! [`Timer`] and returns. Two implementations are provided:
//! - [`TokioTimer`] spawns a sleeping task on a tokio runtime
//! - [`ManualTimer`] is a virtual clock advanced by the caller

use parking_lot::Mutex;
use std::time::Duration;
use sync_core::SyncError;
use tokio::runtime::Handle as RuntimeHandle;
use tracing::trace;

/// One-shot callback handed to a timer
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Fires a callback once after a delay
pub trait Timer: Send + Sync {
    /// Run `callback` once, no earlier than `delay` from now
    fn schedule_after(&self, delay: Duration, callback: Callback);
}

/// Timer backed by a tokio runtime
#[derive(Clone, Debug)]
pub struct TokioTimer {
    runtime: RuntimeHandle,
}

impl TokioTimer {
    /// Create a timer that spawns onto the given runtime
    pub fn new(runtime: RuntimeHandle) -> Self {
        Self { runtime }
    }

    /// Create a timer on the runtime the caller is running in
    pub fn current() -> Result<Self, SyncError> {
        RuntimeHandle::try_current()
            .map(Self::new)
            .map_err(|_| SyncError::NoRuntime)
    }
}

impl Timer for TokioTimer {
    fn schedule_after(&self, delay: Duration, callback: Callback) {
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
    }
}

/// Callback waiting on the virtual clock
struct Scheduled {
    due: Duration,
    seq: u64,
    callback: Callback,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    seq: u64,
    queue: Vec<Scheduled>,
}

/// Virtual clock timer
///
/// Time only moves when [`advance`](ManualTimer::advance) or
/// [`advance_to`](ManualTimer::advance_to) is called. Due callbacks fire in
/// due order, ties broken by scheduling order. Callbacks run without the
/// internal lock held, so they may schedule further callbacks; those fire in
/// the same call if they fall inside the window.
#[derive(Default)]
pub struct ManualTimer {
    state: Mutex<ManualState>,
}

impl ManualTimer {
    /// Create a clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Number of callbacks waiting to fire
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Move the clock forward by `by`, returning how many callbacks fired
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        self.advance_to(target)
    }

    /// Move the clock to `target`, returning how many callbacks fired
    ///
    /// Targets in the past leave the clock where it is.
    pub fn advance_to(&self, target: Duration) -> usize {
        let mut fired = 0;

        loop {
            let next = {
                let mut state = self.state.lock();
                let earliest = state
                    .queue
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.due <= target)
                    .min_by_key(|(_, s)| (s.due, s.seq))
                    .map(|(idx, _)| idx);

                match earliest {
                    Some(idx) => {
                        let scheduled = state.queue.swap_remove(idx);
                        state.now = state.now.max(scheduled.due);
                        Some(scheduled)
                    }
                    None => {
                        state.now = state.now.max(target);
                        None
                    }
                }
            };

            match next {
                Some(scheduled) => {
                    trace!("manual timer firing callback due at {:?}", scheduled.due);
                    (scheduled.callback)();
                    fired += 1;
                }
                None => return fired,
            }
        }
    }
}

impl Timer for ManualTimer {
    fn schedule_after(&self, delay: Duration, callback: Callback) {
        let mut state = self.state.lock();
        let due = state.now + delay;
        let seq = state.seq;
        state.seq += 1;
        state.queue.push(Scheduled { due, seq, callback });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> Callback) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_for = Arc::clone(&log);
        let make = move |name: &'static str| -> Callback {
            let log = Arc::clone(&log_for);
            Box::new(move || log.lock().push(name))
        };
        (log, make)
    }

    #[test]
    fn test_manual_timer_fires_in_due_order() {
        let timer = ManualTimer::new();
        let (log, cb) = recorder();

        timer.schedule_after(Duration::from_millis(300), cb("late"));
        timer.schedule_after(Duration::from_millis(100), cb("early"));
        timer.schedule_after(Duration::from_millis(100), cb("early-second"));

        assert_eq!(timer.advance(Duration::from_millis(99)), 0);
        assert_eq!(timer.advance(Duration::from_millis(1)), 2);
        assert_eq!(*log.lock(), vec!["early", "early-second"]);
        assert_eq!(timer.pending(), 1);

        assert_eq!(timer.advance(Duration::from_secs(1)), 1);
        assert_eq!(*log.lock(), vec!["early", "early-second", "late"]);
        assert_eq!(timer.now(), Duration::from_millis(1100));
    }

    #[test]
    fn test_manual_timer_nested_schedule() {
        let timer = Arc::new(ManualTimer::new());
        let (log, cb) = recorder();
        let inner = cb("inner");

        let t = Arc::clone(&timer);
        timer.schedule_after(
            Duration::from_millis(10),
            Box::new(move || t.schedule_after(Duration::from_millis(10), inner)),
        );

        // Both the outer callback (t=10) and the one it schedules (t=20) fire
        assert_eq!(timer.advance(Duration::from_millis(25)), 2);
        assert_eq!(*log.lock(), vec!["inner"]);
    }

    #[test]
    fn test_manual_timer_advance_to_past_is_noop() {
        let timer = ManualTimer::new();
        timer.advance(Duration::from_secs(5));
        assert_eq!(timer.advance_to(Duration::from_secs(1)), 0);
        assert_eq!(timer.now(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_timer_waits_for_delay() {
        let timer = TokioTimer::current().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();
        let start = tokio::time::Instant::now();

        timer.schedule_after(
            Duration::from_millis(750),
            Box::new(move || {
                let _ = tx.send(());
            }),
        );

        rx.await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(750));
    }

    #[test]
    fn test_tokio_timer_requires_runtime() {
        assert!(matches!(TokioTimer::current(), Err(SyncError::NoRuntime)));
    }
}

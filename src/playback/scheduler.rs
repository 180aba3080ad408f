//! Periodic Tick Scheduling
//!
//! The engine is driven by an injected [`Scheduler`] that invokes a
//! callback every period until the callback asks to stop or the returned
//! handle is cancelled.
//!
//! - [`ThreadScheduler`]: wall-clock ticks on a background thread
//! - [`ManualScheduler`]: ticks fired explicitly, for tests and hosts
//!   that own their own event loop

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error};

/// Returned by a tick callback to keep or stop the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Stop,
}

/// Callback invoked on every tick.
pub type TickCallback = Box<dyn FnMut() -> TickControl + Send + 'static>;

/// Handle to a running schedule.
pub trait TickHandle {
    /// Stops the schedule. No callback runs after this returns.
    fn cancel(&mut self);

    /// Returns true while the schedule can still fire.
    fn is_active(&self) -> bool;
}

/// Capability for requesting a repeating, cancelable callback.
pub trait Scheduler {
    type Handle: TickHandle + Send;

    fn schedule_repeating(&self, period: Duration, callback: TickCallback) -> Self::Handle;
}

/// Runs each schedule on its own background thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadScheduler;

impl ThreadScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl Scheduler for ThreadScheduler {
    type Handle = ThreadTickHandle;

    fn schedule_repeating(&self, period: Duration, mut callback: TickCallback) -> ThreadTickHandle {
        let (stop_tx, stop_rx) = channel::<()>();
        let running = Arc::new(AtomicBool::new(true));
        let running_flag = Arc::clone(&running);

        let worker = thread::spawn(move || {
            let mut deadline = Instant::now() + period;

            loop {
                let wait = deadline.saturating_duration_since(Instant::now());

                // A message or a dropped sender both mean cancel
                match stop_rx.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }

                if callback() == TickControl::Stop {
                    break;
                }
                // After a stall, fire at most one late tick instead of a burst
                deadline = (deadline + period).max(Instant::now());
            }

            running_flag.store(false, Ordering::Release);
            debug!("Tick thread exited");
        });

        ThreadTickHandle {
            stop_tx: Some(stop_tx),
            worker: Some(worker),
            running,
        }
    }
}

/// Handle for a [`ThreadScheduler`] schedule. Dropping it cancels.
pub struct ThreadTickHandle {
    stop_tx: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl TickHandle for ThreadTickHandle {
    fn cancel(&mut self) {
        // Dropping the sender wakes the worker immediately
        self.stop_tx.take();

        if let Some(worker) = self.worker.take() {
            if worker.thread().id() == thread::current().id() {
                return;
            }
            if worker.join().is_err() {
                error!("Tick thread panicked");
            }
        }
        self.running.store(false, Ordering::Release);
    }

    fn is_active(&self) -> bool {
        self.worker.is_some() && self.running.load(Ordering::Acquire)
    }
}

impl Drop for ThreadTickHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

struct ManualEntry {
    id: u64,
    period: Duration,
    active: Arc<AtomicBool>,
    callback: TickCallback,
}

/// Scheduler whose ticks are fired by calling [`ManualScheduler::fire`].
///
/// Clones share the same set of schedules.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    entries: Arc<Mutex<Vec<ManualEntry>>>,
    next_id: Arc<AtomicU64>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires one tick on every active schedule.
    ///
    /// Returns the number of callbacks invoked.
    pub fn fire(&self) -> usize {
        let mut entries = self.take_entries();
        let mut fired = 0;

        for entry in entries.iter_mut() {
            if !entry.active.load(Ordering::Acquire) {
                continue;
            }
            fired += 1;
            if (entry.callback)() == TickControl::Stop {
                entry.active.store(false, Ordering::Release);
            }
        }

        self.restore_entries(entries);
        fired
    }

    /// Fires `count` ticks in a row.
    pub fn fire_times(&self, count: usize) {
        for _ in 0..count {
            self.fire();
        }
    }

    /// Number of schedules that can still fire.
    pub fn active_count(&self) -> usize {
        self.lock_entries()
            .iter()
            .filter(|e| e.active.load(Ordering::Acquire))
            .count()
    }

    /// Period of the most recently created active schedule.
    pub fn active_period(&self) -> Option<Duration> {
        self.lock_entries()
            .iter()
            .rev()
            .find(|e| e.active.load(Ordering::Acquire))
            .map(|e| e.period)
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, Vec<ManualEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Callbacks run without the entry lock held so they may schedule or
    // cancel through the same scheduler.
    fn take_entries(&self) -> Vec<ManualEntry> {
        std::mem::take(&mut *self.lock_entries())
    }

    fn restore_entries(&self, mut fired: Vec<ManualEntry>) {
        let mut entries = self.lock_entries();
        fired.append(&mut entries);
        fired.retain(|e| e.active.load(Ordering::Acquire));
        fired.sort_by_key(|e| e.id);
        *entries = fired;
    }
}

impl Scheduler for ManualScheduler {
    type Handle = ManualTickHandle;

    fn schedule_repeating(&self, period: Duration, callback: TickCallback) -> ManualTickHandle {
        let active = Arc::new(AtomicBool::new(true));
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.lock_entries().push(ManualEntry {
            id,
            period,
            active: Arc::clone(&active),
            callback,
        });

        ManualTickHandle { active }
    }
}

/// Handle for a [`ManualScheduler`] schedule.
#[derive(Debug, Clone)]
pub struct ManualTickHandle {
    active: Arc<AtomicBool>,
}

impl TickHandle for ManualTickHandle {
    fn cancel(&mut self) {
        self.active.store(false, Ordering::Release);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

//! Player
//!
//! Binds a [`WorkoutEngine`] to a [`Scheduler`] so it ticks on its own,
//! and notifies an observer after every tick and control call.
//!
//! Engine state lives behind a single mutex. The tick callback and every
//! control call take that lock for their whole update, so an observer
//! never sees a step advanced with the previous step's countdown.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::debug;

use super::engine::{EngineSnapshot, TickOutcome, WorkoutEngine};
use super::scheduler::{Scheduler, TickControl, TickHandle};

/// Default tick period.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Receives a snapshot after every state change.
pub type Observer = Arc<dyn Fn(&EngineSnapshot) + Send + Sync>;

/// Drives a workout engine in real time.
///
/// Call [`Player::dispose`] (or drop the player) before discarding it so
/// no tick outlives the engine.
///
/// # Example
///
/// ```
/// use resetrunner::playback::{ManualScheduler, Player, WorkoutEngine};
/// use resetrunner::workout::EnrichedStep;
///
/// let steps = vec![EnrichedStep::Rest { name: "Rest".to_string(), duration: 2 }];
/// let scheduler = ManualScheduler::new();
/// let mut player = Player::new(WorkoutEngine::new(steps), scheduler.clone());
///
/// player.play();
/// scheduler.fire_times(2);
/// assert!(player.snapshot().is_finished);
/// player.dispose();
/// ```
pub struct Player<S: Scheduler> {
    engine: Arc<Mutex<WorkoutEngine>>,
    scheduler: S,
    period: Duration,
    observer: Option<Observer>,
    timer: Option<S::Handle>,
}

impl<S: Scheduler> Player<S> {
    /// Creates a player ticking once per second.
    pub fn new(engine: WorkoutEngine, scheduler: S) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            scheduler,
            period: TICK_PERIOD,
            observer: None,
            timer: None,
        }
    }

    /// Sets the tick period. Takes effect on the next `play`.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Registers the state observer.
    pub fn with_observer(mut self, observer: impl Fn(&EngineSnapshot) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Starts or resumes playback and the tick schedule.
    pub fn play(&mut self) {
        let (running, snapshot) = self.apply(WorkoutEngine::play);
        self.notify(&snapshot);

        if running && !self.timer_active() {
            self.start_timer();
        }
    }

    /// Pauses playback; no tick fires until the next `play`.
    pub fn pause(&mut self) {
        let (_, snapshot) = self.apply(WorkoutEngine::pause);
        self.stop_timer();
        self.notify(&snapshot);
    }

    /// Pauses when playing, plays otherwise.
    pub fn toggle(&mut self) {
        if self.lock_engine().is_running() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn skip_to_next(&mut self) {
        let (running, snapshot) = self.apply(WorkoutEngine::skip_to_next);
        if !running {
            self.stop_timer();
        }
        self.notify(&snapshot);
    }

    pub fn skip_to_previous(&mut self) {
        let (_, snapshot) = self.apply(WorkoutEngine::skip_to_previous);
        self.notify(&snapshot);
    }

    /// Current engine state.
    pub fn snapshot(&self) -> EngineSnapshot {
        self.lock_engine().snapshot()
    }

    pub fn is_finished(&self) -> bool {
        self.lock_engine().is_finished()
    }

    /// Cancels any pending tick. Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.timer.is_some() {
            debug!("Disposing player");
        }
        self.stop_timer();
    }

    /// Applies a control call under the lock and returns the new state.
    fn apply(&self, control: impl FnOnce(&mut WorkoutEngine)) -> (bool, EngineSnapshot) {
        let mut engine = self.lock_engine();
        control(&mut *engine);
        (engine.is_running(), engine.snapshot())
    }

    fn lock_engine(&self) -> MutexGuard<'_, WorkoutEngine> {
        lock(&self.engine)
    }

    fn notify(&self, snapshot: &EngineSnapshot) {
        if let Some(observer) = &self.observer {
            observer(snapshot);
        }
    }

    fn timer_active(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| timer.is_active())
    }

    fn start_timer(&mut self) {
        // A schedule that stopped itself may still hold a handle
        self.stop_timer();

        let engine = Arc::clone(&self.engine);
        let observer = self.observer.clone();

        let handle = self.scheduler.schedule_repeating(
            self.period,
            Box::new(move || {
                let (outcome, running, snapshot) = {
                    let mut engine = lock(&engine);
                    let outcome = engine.tick();
                    (outcome, engine.is_running(), engine.snapshot())
                };

                if outcome != TickOutcome::Idle {
                    if let Some(observer) = &observer {
                        observer(&snapshot);
                    }
                }

                if running {
                    TickControl::Continue
                } else {
                    TickControl::Stop
                }
            }),
        );

        debug!("Tick schedule started ({:?} period)", self.period);
        self.timer = Some(handle);
    }

    // Must not be called with the engine lock held: cancelling a thread
    // schedule joins a tick that may be waiting for that lock.
    fn stop_timer(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.cancel();
            debug!("Tick schedule cancelled");
        }
    }
}

impl<S: Scheduler> Drop for Player<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn lock(engine: &Mutex<WorkoutEngine>) -> MutexGuard<'_, WorkoutEngine> {
    engine.lock().unwrap_or_else(PoisonError::into_inner)
}

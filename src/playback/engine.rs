//! Workout Playback Engine
//!
//! State machine that counts down each step of a workout, advances
//! through the sequence, and requests tones at transitions.
//!
//! The engine has no timer of its own: a driver calls [`WorkoutEngine::tick`]
//! once per second while playing (see [`crate::playback::Player`]), and
//! control calls are applied in between ticks.

use log::{debug, info};
use serde::Serialize;

use super::tone::{emit_quietly, SilentTone, ToneSignal, ToneSink};
use crate::workout::EnrichedStep;

/// Seconds before the end of a step at which warning tones begin.
pub const WARNING_WINDOW_SECS: u32 = 4;

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Paused or finished; nothing changed
    Idle,
    /// One second was counted down
    Counted,
    /// The current step expired and the next one began
    Advanced,
    /// The last step expired
    Finished,
}

/// Read-only view of the engine state and derived values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub current_step_index: usize,
    pub step_count: usize,
    pub current_step: Option<EnrichedStep>,
    pub next_step: Option<EnrichedStep>,
    pub time_left_in_current_step: u32,
    pub is_paused: bool,
    pub is_finished: bool,
    pub total_workout_duration: u32,
    pub total_elapsed: u32,
    pub total_remaining: u32,
    pub progress_fraction: f64,
    pub exercise_step_number: usize,
    pub total_exercise_steps: usize,
}

/// Countdown state machine for one workout attempt.
///
/// # Example
///
/// ```
/// use resetrunner::playback::{RecordingTone, WorkoutEngine};
/// use resetrunner::workout::EnrichedStep;
///
/// let steps = vec![EnrichedStep::Rest { name: "Rest".to_string(), duration: 3 }];
/// let mut engine = WorkoutEngine::with_tone(steps, Box::new(RecordingTone::new()));
///
/// engine.play();
/// for _ in 0..3 {
///     engine.tick();
/// }
/// assert!(engine.is_finished());
/// ```
pub struct WorkoutEngine {
    steps: Vec<EnrichedStep>,
    current_step_index: usize,
    time_left: u32,
    paused: bool,
    tone: Box<dyn ToneSink>,
}

impl WorkoutEngine {
    /// Creates an engine that plays no tones.
    pub fn new(steps: Vec<EnrichedStep>) -> Self {
        Self::with_tone(steps, Box::new(SilentTone))
    }

    /// Creates an engine, paused at the first step.
    ///
    /// An empty sequence yields an engine that is already finished.
    pub fn with_tone(steps: Vec<EnrichedStep>, tone: Box<dyn ToneSink>) -> Self {
        let time_left = steps.first().map_or(0, EnrichedStep::duration);

        if steps.is_empty() {
            debug!("Engine created with no steps; starting finished");
        } else {
            debug!("Engine created with {} steps", steps.len());
        }

        Self {
            steps,
            current_step_index: 0,
            time_left,
            paused: true,
            tone,
        }
    }

    /// Starts or resumes the countdown.
    pub fn play(&mut self) {
        if self.is_finished() || !self.paused {
            return;
        }
        self.paused = false;
        info!("Playing step {} of {}", self.current_step_index + 1, self.steps.len());
        self.emit(ToneSignal::Start);
    }

    /// Halts the countdown. Silent.
    pub fn pause(&mut self) {
        if !self.paused {
            info!("Paused at step {} ({}s left)", self.current_step_index + 1, self.time_left);
        }
        self.paused = true;
    }

    /// Jumps to the next step, crediting the rest of the current one.
    pub fn skip_to_next(&mut self) {
        if self.is_finished() {
            return;
        }
        debug!("Skipping step {}", self.current_step_index + 1);
        self.advance();
    }

    /// Returns to the previous step with its timer reset to full.
    pub fn skip_to_previous(&mut self) {
        if self.current_step_index == 0 || self.is_finished() {
            return;
        }
        self.current_step_index -= 1;
        self.time_left = self.steps[self.current_step_index].duration();
        debug!("Back to step {}", self.current_step_index + 1);
        self.emit(ToneSignal::Start);
    }

    /// Counts down one second.
    ///
    /// A step whose last second elapses advances the workout; the seconds
    /// just before that request a warning tone.
    pub fn tick(&mut self) -> TickOutcome {
        if self.paused || self.is_finished() {
            return TickOutcome::Idle;
        }

        if self.time_left <= 1 {
            self.advance();
            return if self.is_finished() {
                TickOutcome::Finished
            } else {
                TickOutcome::Advanced
            };
        }

        if self.time_left <= WARNING_WINDOW_SECS {
            self.emit(ToneSignal::Warn);
        }
        self.time_left -= 1;
        TickOutcome::Counted
    }

    /// Moves to the next step or into the finished state.
    fn advance(&mut self) {
        let next = self.current_step_index + 1;

        if next >= self.steps.len() {
            self.current_step_index = self.steps.len();
            self.time_left = 0;
            info!("Workout finished");
        } else {
            self.current_step_index = next;
            self.time_left = self.steps[next].duration();
            debug!(
                "Step {} of {}: {} ({}s)",
                next + 1,
                self.steps.len(),
                self.steps[next].name(),
                self.time_left
            );
        }

        self.emit(ToneSignal::Start);
    }

    fn emit(&self, signal: ToneSignal) {
        emit_quietly(self.tone.as_ref(), signal);
    }

    pub fn steps(&self) -> &[EnrichedStep] {
        &self.steps
    }

    pub fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    /// The step being played, or `None` once finished.
    pub fn current_step(&self) -> Option<&EnrichedStep> {
        self.steps.get(self.current_step_index)
    }

    /// The step after the current one, if any.
    pub fn next_step(&self) -> Option<&EnrichedStep> {
        self.steps.get(self.current_step_index + 1)
    }

    pub fn time_left_in_current_step(&self) -> u32 {
        self.time_left
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_finished(&self) -> bool {
        self.current_step_index >= self.steps.len()
    }

    /// Playing means not paused and not finished.
    pub fn is_running(&self) -> bool {
        !self.paused && !self.is_finished()
    }

    /// Saturates at `u32::MAX`; loaded workouts are validated to fit.
    pub fn total_workout_duration(&self) -> u32 {
        sum_durations(&self.steps)
    }

    pub fn total_elapsed(&self) -> u32 {
        let completed = sum_durations(&self.steps[..self.current_step_index]);
        let in_step = self
            .current_step()
            .map_or(0, |step| step.duration().saturating_sub(self.time_left));
        completed.saturating_add(in_step)
    }

    pub fn total_remaining(&self) -> u32 {
        self.total_workout_duration()
            .saturating_sub(self.total_elapsed())
    }

    /// Fraction of the current step still left, in `[0, 1]`.
    pub fn progress_fraction(&self) -> f64 {
        match self.current_step() {
            Some(step) if step.duration() > 0 => {
                f64::from(self.time_left) / f64::from(step.duration())
            }
            _ => 0.0,
        }
    }

    /// 1-based position of the current step among exercise steps only.
    pub fn exercise_step_number(&self) -> usize {
        if self.is_finished() {
            return self.total_exercise_steps();
        }
        self.steps[..=self.current_step_index]
            .iter()
            .filter(|step| step.is_exercise())
            .count()
    }

    pub fn total_exercise_steps(&self) -> usize {
        self.steps.iter().filter(|step| step.is_exercise()).count()
    }

    /// Captures the full observable state.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            current_step_index: self.current_step_index,
            step_count: self.steps.len(),
            current_step: self.current_step().cloned(),
            next_step: self.next_step().cloned(),
            time_left_in_current_step: self.time_left,
            is_paused: self.paused,
            is_finished: self.is_finished(),
            total_workout_duration: self.total_workout_duration(),
            total_elapsed: self.total_elapsed(),
            total_remaining: self.total_remaining(),
            progress_fraction: self.progress_fraction(),
            exercise_step_number: self.exercise_step_number(),
            total_exercise_steps: self.total_exercise_steps(),
        }
    }
}

impl std::fmt::Debug for WorkoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkoutEngine")
            .field("steps", &self.steps.len())
            .field("current_step_index", &self.current_step_index)
            .field("time_left", &self.time_left)
            .field("paused", &self.paused)
            .finish()
    }
}

fn sum_durations(steps: &[EnrichedStep]) -> u32 {
    steps
        .iter()
        .fold(0u32, |total, step| total.saturating_add(step.duration()))
}

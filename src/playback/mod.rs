//! Workout Playback Module
//!
//! Provides the countdown engine and the pieces that drive it in
//! real time.
//!
//! # Architecture
//!
//! - [`engine`]: Step countdown state machine
//! - [`tone`]: Audible cues requested by the engine
//! - [`scheduler`]: Cancelable periodic ticks
//! - [`player`]: Engine, scheduler and observer bound together

pub mod engine;
pub mod player;
pub mod scheduler;
pub mod tone;

pub use engine::{EngineSnapshot, TickOutcome, WorkoutEngine};
pub use player::{Observer, Player, TICK_PERIOD};
pub use scheduler::{
    ManualScheduler, ManualTickHandle, Scheduler, ThreadScheduler, ThreadTickHandle, TickCallback,
    TickControl, TickHandle,
};
pub use tone::{RecordingTone, SilentTone, TerminalBell, ToneError, ToneSignal, ToneSink};

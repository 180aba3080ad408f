//! ResetRunner - Workout Playback Engine
//!
//! Plays short "reset" routines: timed exercise and rest steps counted
//! down in real time, with pause/resume, skipping, audible cues and
//! progress aggregates for a presentation layer to render.
//!
//! # Architecture
//!
//! The library is organized into two main modules:
//!
//! - [`workout`]: Step data structures, compact step parsing and loading
//! - [`playback`]: Countdown engine, tone cues, tick scheduling, player
//!
//! # Example
//!
//! ```rust,no_run
//! use resetrunner::load_workout;
//! use resetrunner::playback::{Player, TerminalBell, ThreadScheduler, WorkoutEngine};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Load a workout from YAML
//!     let workout = load_workout("morning.yaml")?;
//!
//!     // Create the engine and a real-time player
//!     let engine = WorkoutEngine::with_tone(workout.steps, Box::new(TerminalBell));
//!     let mut player = Player::new(engine, ThreadScheduler::new())
//!         .with_observer(|s| println!("{}s left", s.time_left_in_current_step));
//!
//!     player.play();
//!     while !player.is_finished() {
//!         std::thread::sleep(std::time::Duration::from_millis(200));
//!     }
//!     player.dispose();
//!     Ok(())
//! }
//! ```

pub mod playback;
pub mod workout;

// Re-export commonly used types
pub use playback::engine::WorkoutEngine;
pub use playback::player::Player;
pub use workout::model::{EnrichedStep, Workout, WorkoutStep};
pub use workout::parser::load_workout;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "ResetRunner";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_app_name() {
        assert_eq!(APP_NAME, "ResetRunner");
    }

    #[test]
    fn test_module_exports_step() {
        let step = WorkoutStep::exercise("squat", 30);
        assert_eq!(step.duration(), 30);
    }

    #[test]
    fn test_module_exports_engine() {
        let engine = WorkoutEngine::new(Vec::new());
        assert!(engine.is_finished());
    }

    #[test]
    fn test_version_format() {
        let parts: Vec<&str> = VERSION.split('.').collect();
        assert!(parts.len() >= 2, "Version should have at least major.minor");
        for part in parts {
            assert!(part.parse::<u32>().is_ok(), "Version components should be numeric");
        }
    }
}

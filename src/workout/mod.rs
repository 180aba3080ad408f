//! Workout Definition Module
//!
//! Provides data structures and utilities for defining, parsing, and
//! validating workouts.
//!
//! # Structure
//!
//! - [`model`]: Core data structures (steps, exercise metadata)
//! - [`parser`]: Compact step encoding and YAML loading
//! - [`normalize`]: Exercise metadata resolution
//! - [`validator`]: Validation of playable sequences

pub mod model;
pub mod normalize;
pub mod parser;
pub mod validator;

pub use model::{
    EnrichedStep, ExerciseCatalog, ExerciseInfo, StepSource, Workout, WorkoutDefinition,
    WorkoutStep,
};
pub use normalize::{enrich_steps, normalize_compact};
pub use parser::{load_workout, parse_steps, LoadError, ParseError};
pub use validator::{validate_workout, ValidationError};

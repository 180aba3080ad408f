//! Workout Data Model
//!
//! Core data structures representing workout steps and exercise metadata.
//!
//! # Example YAML Format
//!
//! ```yaml
//! name: Morning reset
//! rest_label: Rest
//! exercises:
//!   - id: box_breath
//!     name: Box breathing
//!     note: Four counts in, hold, out, hold
//!   - id: squat
//!     name: Air squat
//!     media: https://media.example/squat.gif
//! steps: "box_breath 60, R, squat (45), rest 15, box_breath 60"
//! ```
//!
//! Steps may also be listed in structured form:
//!
//! ```yaml
//! steps:
//!   - type: exercise
//!     exercise_id: squat
//!     duration: 45
//!   - type: rest
//!     duration: 15
//! ```

use std::collections::HashMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// Default display name given to rest steps.
pub const DEFAULT_REST_LABEL: &str = "Rest";

/// A single raw step of a workout, before exercise metadata is resolved.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkoutStep {
    /// A timed exercise referencing the exercise catalog
    Exercise { exercise_id: String, duration: u32 },
    /// A timed rest period
    Rest { duration: u32 },
}

impl WorkoutStep {
    /// Creates an exercise step.
    pub fn exercise(exercise_id: impl Into<String>, duration: u32) -> Self {
        Self::Exercise {
            exercise_id: exercise_id.into().trim().to_string(),
            duration,
        }
    }

    /// Creates a rest step.
    pub fn rest(duration: u32) -> Self {
        Self::Rest { duration }
    }

    /// Returns the step duration in seconds.
    pub fn duration(&self) -> u32 {
        match self {
            Self::Exercise { duration, .. } | Self::Rest { duration } => *duration,
        }
    }
}

/// Metadata describing an exercise, as supplied by the content source.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExerciseInfo {
    /// Identifier referenced by exercise steps
    pub id: String,

    /// Human-readable name shown while the exercise plays
    pub name: String,

    /// Optional image/video reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,

    /// Optional coaching note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ExerciseInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into().trim().to_string(),
            name: name.into(),
            media: None,
            note: None,
        }
    }

    /// Sets the media reference.
    pub fn with_media(mut self, media: impl Into<String>) -> Self {
        self.media = Some(media.into());
        self
    }

    /// Sets the coaching note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Lookup table from exercise id to its metadata.
#[derive(Debug, Clone, Default)]
pub struct ExerciseCatalog {
    entries: HashMap<String, ExerciseInfo>,
}

impl ExerciseCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from a list of exercises. Later duplicates win.
    pub fn from_exercises(exercises: impl IntoIterator<Item = ExerciseInfo>) -> Self {
        let mut catalog = Self::new();
        for exercise in exercises {
            catalog.insert(exercise);
        }
        catalog
    }

    /// Adds or replaces an exercise.
    pub fn insert(&mut self, exercise: ExerciseInfo) {
        self.entries.insert(exercise.id.clone(), exercise);
    }

    /// Looks up an exercise by id.
    pub fn get(&self, id: &str) -> Option<&ExerciseInfo> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A step with its exercise metadata resolved; the engine's working unit.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnrichedStep {
    Exercise { exercise: ExerciseInfo, duration: u32 },
    Rest { name: String, duration: u32 },
}

impl EnrichedStep {
    /// Returns the step duration in seconds.
    pub fn duration(&self) -> u32 {
        match self {
            Self::Exercise { duration, .. } | Self::Rest { duration, .. } => *duration,
        }
    }

    /// Returns the display name of the step.
    pub fn name(&self) -> &str {
        match self {
            Self::Exercise { exercise, .. } => &exercise.name,
            Self::Rest { name, .. } => name,
        }
    }

    pub fn is_exercise(&self) -> bool {
        matches!(self, Self::Exercise { .. })
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, Self::Rest { .. })
    }
}

/// Workout definition as stored in a YAML file.
#[derive(Deserialize, Debug, Clone)]
pub struct WorkoutDefinition {
    /// Display name of the workout
    #[serde(default = "default_workout_name")]
    pub name: String,

    /// Display name for rest steps
    #[serde(default = "default_rest_label")]
    pub rest_label: String,

    /// Exercise metadata available to the steps
    #[serde(default)]
    pub exercises: Vec<ExerciseInfo>,

    /// Steps in compact or structured form
    pub steps: StepSource,
}

fn default_workout_name() -> String {
    "Workout".to_string()
}

fn default_rest_label() -> String {
    DEFAULT_REST_LABEL.to_string()
}

/// Where the raw steps of a definition come from.
#[derive(Debug, Clone, PartialEq)]
pub enum StepSource {
    /// Compact comma-separated encoding, parsed later
    Compact(String),
    /// Already structured steps
    Structured(Vec<WorkoutStep>),
}

impl<'de> Deserialize<'de> for StepSource {
    /// Accepts either a compact string or a list of structured steps.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let val = Value::deserialize(deserializer)?;
        match val {
            Value::Null => Ok(StepSource::Structured(Vec::new())),
            Value::String(s) => Ok(StepSource::Compact(s)),
            seq @ Value::Sequence(_) => serde_yaml::from_value(seq)
                .map(StepSource::Structured)
                .map_err(de::Error::custom),
            _ => Err(de::Error::custom(
                "Expected a compact step string or a list of steps",
            )),
        }
    }
}

/// A fully resolved workout ready for playback.
#[derive(Debug, Clone)]
pub struct Workout {
    pub name: String,
    pub steps: Vec<EnrichedStep>,
}

impl Workout {
    /// Total duration of all steps in seconds.
    pub fn total_duration(&self) -> u32 {
        self.steps
            .iter()
            .fold(0u32, |total, step| total.saturating_add(step.duration()))
    }

    /// Number of exercise steps, ignoring rests.
    pub fn exercise_count(&self) -> usize {
        self.steps.iter().filter(|s| s.is_exercise()).count()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

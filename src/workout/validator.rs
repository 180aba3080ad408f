//! Workout Validation
//!
//! Checks an enriched step sequence before an engine is built from it:
//! - The sequence is not empty
//! - Every step has a positive duration
//! - The total fits the engine's `u32` second counters
//!
//! Unusual but playable layouts (back-to-back rests, leading or trailing
//! rests) are only logged.

use log::{debug, info, warn};
use thiserror::Error;

use super::model::EnrichedStep;

/// Validation error types for user-friendly error messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Workout has no playable steps")]
    EmptyWorkout,

    #[error("Step {position} ('{name}') has zero duration")]
    ZeroDuration { position: usize, name: String },

    #[error("Workout lasts {total} seconds; at most {} are supported", u32::MAX)]
    TooLong { total: u64 },
}

/// Validates an enriched step sequence.
///
/// Returns the first error found; positions are 1-based.
pub fn validate_workout(steps: &[EnrichedStep]) -> Result<(), ValidationError> {
    info!("Validating workout with {} steps", steps.len());

    if steps.is_empty() {
        return Err(ValidationError::EmptyWorkout);
    }

    if let Some((index, step)) = steps.iter().enumerate().find(|(_, s)| s.duration() == 0) {
        return Err(ValidationError::ZeroDuration {
            position: index + 1,
            name: step.name().to_string(),
        });
    }

    let total: u64 = steps.iter().map(|s| u64::from(s.duration())).sum();
    if total > u64::from(u32::MAX) {
        return Err(ValidationError::TooLong { total });
    }

    for (index, pair) in steps.windows(2).enumerate() {
        if pair[0].is_rest() && pair[1].is_rest() {
            warn!(
                "Steps {} and {} are consecutive rests",
                index + 1,
                index + 2
            );
        }
    }

    if steps.first().is_some_and(EnrichedStep::is_rest) {
        debug!("Workout begins with a rest");
    }
    if steps.last().is_some_and(EnrichedStep::is_rest) {
        debug!("Workout ends with a rest");
    }

    if !steps.iter().any(EnrichedStep::is_exercise) {
        warn!("Workout contains only rest steps");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::model::ExerciseInfo;

    fn exercise(id: &str, duration: u32) -> EnrichedStep {
        EnrichedStep::Exercise {
            exercise: ExerciseInfo::new(id, id.to_uppercase()),
            duration,
        }
    }

    fn rest(duration: u32) -> EnrichedStep {
        EnrichedStep::Rest {
            name: "Rest".to_string(),
            duration,
        }
    }

    #[test]
    fn test_valid_workout() {
        let steps = vec![exercise("a", 10), rest(5), exercise("b", 8)];
        assert!(validate_workout(&steps).is_ok());
    }

    #[test]
    fn test_empty_workout() {
        assert_eq!(validate_workout(&[]), Err(ValidationError::EmptyWorkout));
    }

    #[test]
    fn test_zero_duration() {
        let steps = vec![exercise("a", 10), exercise("b", 0)];
        assert_eq!(
            validate_workout(&steps),
            Err(ValidationError::ZeroDuration {
                position: 2,
                name: "B".to_string()
            })
        );
    }

    #[test]
    fn test_total_overflowing_u32_rejected() {
        let steps = vec![rest(3_000_000_000), rest(3_000_000_000)];
        assert_eq!(
            validate_workout(&steps),
            Err(ValidationError::TooLong {
                total: 6_000_000_000
            })
        );
    }

    #[test]
    fn test_total_at_u32_max_allowed() {
        let steps = vec![rest(u32::MAX - 10), exercise("a", 10)];
        assert!(validate_workout(&steps).is_ok());
    }

    #[test]
    fn test_consecutive_rests_allowed() {
        let steps = vec![rest(5), rest(5), exercise("a", 10), rest(5)];
        assert!(validate_workout(&steps).is_ok());
    }

    #[test]
    fn test_rest_only_allowed() {
        assert!(validate_workout(&[rest(30)]).is_ok());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ValidationError::EmptyWorkout.to_string(),
            "Workout has no playable steps"
        );
        let err = ValidationError::ZeroDuration {
            position: 3,
            name: "Plank".to_string(),
        };
        assert!(err.to_string().contains("Step 3"));
        assert!(err.to_string().contains("Plank"));
    }
}

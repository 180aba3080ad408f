//! Step Normalization
//!
//! Resolves raw steps against the exercise catalog. Exercise steps whose
//! id is not in the catalog are dropped rather than failing the workout,
//! so a renamed or removed exercise simply disappears from playback.

use log::{debug, warn};

use super::model::{EnrichedStep, ExerciseCatalog, WorkoutStep};
use super::parser::{parse_steps, ParseError};

/// Enriches raw steps with exercise metadata.
///
/// Rest steps are given `rest_label` as display name. Order is preserved.
pub fn enrich_steps(
    steps: &[WorkoutStep],
    catalog: &ExerciseCatalog,
    rest_label: &str,
) -> Vec<EnrichedStep> {
    let mut dropped = 0;

    let enriched: Vec<EnrichedStep> = steps
        .iter()
        .enumerate()
        .filter_map(|(index, step)| match step {
            WorkoutStep::Exercise {
                exercise_id,
                duration,
            } => match catalog.get(exercise_id) {
                Some(info) => Some(EnrichedStep::Exercise {
                    exercise: info.clone(),
                    duration: *duration,
                }),
                None => {
                    warn!(
                        "Dropping step {}: unknown exercise '{}'",
                        index + 1,
                        exercise_id
                    );
                    dropped += 1;
                    None
                }
            },
            WorkoutStep::Rest { duration } => Some(EnrichedStep::Rest {
                name: rest_label.to_string(),
                duration: *duration,
            }),
        })
        .collect();

    debug!(
        "Enriched {} steps ({} dropped)",
        enriched.len(),
        dropped
    );
    enriched
}

/// Parses the compact encoding and enriches the result in one pass.
pub fn normalize_compact(
    input: &str,
    catalog: &ExerciseCatalog,
    rest_label: &str,
) -> Result<Vec<EnrichedStep>, ParseError> {
    let steps = parse_steps(input)?;
    Ok(enrich_steps(&steps, catalog, rest_label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::model::{ExerciseInfo, DEFAULT_REST_LABEL};

    fn catalog() -> ExerciseCatalog {
        ExerciseCatalog::from_exercises(vec![
            ExerciseInfo::new("a", "Alpha").with_media("alpha.gif"),
            ExerciseInfo::new("b", "Bravo"),
            ExerciseInfo::new("c", "Charlie").with_note("Slow tempo"),
        ])
    }

    #[test]
    fn test_enrich_resolves_metadata() {
        let steps = vec![WorkoutStep::exercise("a", 10), WorkoutStep::rest(5)];
        let enriched = enrich_steps(&steps, &catalog(), DEFAULT_REST_LABEL);

        assert_eq!(enriched.len(), 2);
        match &enriched[0] {
            EnrichedStep::Exercise { exercise, duration } => {
                assert_eq!(exercise.name, "Alpha");
                assert_eq!(exercise.media.as_deref(), Some("alpha.gif"));
                assert_eq!(*duration, 10);
            }
            other => panic!("expected exercise, got {:?}", other),
        }
        assert_eq!(enriched[1].name(), "Rest");
    }

    #[test]
    fn test_missing_exercise_dropped_order_preserved() {
        let steps = vec![
            WorkoutStep::exercise("a", 10),
            WorkoutStep::rest(5),
            WorkoutStep::exercise("missing", 20),
            WorkoutStep::exercise("b", 8),
            WorkoutStep::exercise("c", 12),
        ];
        let enriched = enrich_steps(&steps, &catalog(), DEFAULT_REST_LABEL);

        assert_eq!(enriched.len(), steps.len() - 1);
        let names: Vec<&str> = enriched.iter().map(EnrichedStep::name).collect();
        assert_eq!(names, vec!["Alpha", "Rest", "Bravo", "Charlie"]);
    }

    #[test]
    fn test_custom_rest_label() {
        let enriched = enrich_steps(&[WorkoutStep::rest(30)], &catalog(), "Odpoczynek");
        assert_eq!(enriched[0].name(), "Odpoczynek");
    }

    #[test]
    fn test_normalize_compact() {
        let enriched = normalize_compact("a 10, R, ghost 5, c (12)", &catalog(), "Rest").unwrap();
        assert_eq!(enriched.len(), 3);
        assert_eq!(enriched[1].duration(), 30);
        assert_eq!(enriched[2].name(), "Charlie");
    }

    #[test]
    fn test_normalize_compact_propagates_parse_error() {
        let result = normalize_compact("a 10, ???", &catalog(), "Rest");
        assert!(result.is_err());
    }

    #[test]
    fn test_enrich_empty() {
        assert!(enrich_steps(&[], &catalog(), "Rest").is_empty());
    }
}

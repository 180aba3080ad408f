//! Workout Parser
//!
//! Handles the compact step encoding and loading workout definitions
//! from YAML files.
//!
//! The compact encoding is a comma-separated list of tokens:
//! - `<exercise_id> <seconds>` or `<exercise_id> (<seconds>)`
//! - `r` / `rest`, case-insensitive, with an optional duration (default 30s)

use std::fs;

use log::{debug, info};
use thiserror::Error;

use super::model::{ExerciseCatalog, StepSource, Workout, WorkoutDefinition, WorkoutStep};
use super::normalize::enrich_steps;
use super::validator::{validate_workout, ValidationError};

/// Duration given to rest tokens that don't specify one.
pub const DEFAULT_REST_SECONDS: u32 = 30;

/// Errors raised while parsing the compact step encoding.
///
/// Positions are 1-based and count every comma-separated token,
/// including skipped empty ones.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Token {position} ('{token}') is neither an exercise nor a rest step")]
    MalformedToken { position: usize, token: String },

    #[error("Token {position} ('{token}') has an invalid duration; expected whole seconds greater than zero")]
    InvalidDuration { position: usize, token: String },
}

/// Errors raised while loading a workout definition.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read workout file '{path}': {source}. Check that the file exists and is readable.")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse workout YAML: {0}. Check the file format.")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Parses the compact step encoding into raw steps.
///
/// Tokens are parsed independently and keep their order. Empty tokens
/// (for example from a trailing comma) are skipped.
///
/// # Example
///
/// ```
/// use resetrunner::workout::parser::parse_steps;
/// use resetrunner::workout::WorkoutStep;
///
/// let steps = parse_steps("squat 45, R, plank (30), rest 15").unwrap();
/// assert_eq!(steps[0], WorkoutStep::exercise("squat", 45));
/// assert_eq!(steps[1], WorkoutStep::rest(30));
/// assert_eq!(steps[3], WorkoutStep::rest(15));
/// ```
pub fn parse_steps(input: &str) -> Result<Vec<WorkoutStep>, ParseError> {
    let mut steps = Vec::new();

    for (index, raw) in input.split(',').enumerate() {
        let token = raw.trim();
        if token.is_empty() {
            debug!("Skipping empty token at position {}", index + 1);
            continue;
        }
        steps.push(parse_token(token, index + 1)?);
    }

    debug!("Parsed {} steps from compact encoding", steps.len());
    Ok(steps)
}

/// Parses a single trimmed, non-empty token.
fn parse_token(token: &str, position: usize) -> Result<WorkoutStep, ParseError> {
    let (head, duration_text) = split_duration(token);

    let duration = match duration_text {
        Some(text) => Some(parse_duration(text).ok_or_else(|| ParseError::InvalidDuration {
            position,
            token: token.to_string(),
        })?),
        None => None,
    };

    if is_rest_keyword(head) {
        return Ok(WorkoutStep::rest(duration.unwrap_or(DEFAULT_REST_SECONDS)));
    }

    match duration {
        Some(duration) if !head.is_empty() => Ok(WorkoutStep::exercise(head, duration)),
        _ => Err(ParseError::MalformedToken {
            position,
            token: token.to_string(),
        }),
    }
}

/// Splits a token into its head and trailing duration text, if any.
///
/// A parenthesized tail is always treated as a duration; a bare trailing
/// word only when it is all digits.
fn split_duration(token: &str) -> (&str, Option<&str>) {
    if let Some(inner) = token.strip_suffix(')') {
        if let Some(open) = inner.rfind('(') {
            return (inner[..open].trim(), Some(inner[open + 1..].trim()));
        }
        return (token, None);
    }

    match token.rsplit_once(char::is_whitespace) {
        Some((head, tail)) if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()) => {
            (head.trim_end(), Some(tail))
        }
        _ => (token, None),
    }
}

fn parse_duration(text: &str) -> Option<u32> {
    text.parse::<u32>().ok().filter(|seconds| *seconds > 0)
}

fn is_rest_keyword(head: &str) -> bool {
    head.eq_ignore_ascii_case("r") || head.eq_ignore_ascii_case("rest")
}

/// Loads a workout from a YAML file.
///
/// This function:
/// 1. Reads and parses the YAML definition
/// 2. Parses the step list (compact or structured)
/// 3. Resolves exercise metadata, dropping unknown exercises
/// 4. Validates the resulting sequence
///
/// # Example
///
/// ```rust,no_run
/// use resetrunner::workout::load_workout;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let workout = load_workout("morning.yaml")?;
///     println!("Loaded {} steps", workout.steps.len());
///     Ok(())
/// }
/// ```
pub fn load_workout(path: &str) -> Result<Workout, LoadError> {
    info!("Loading workout from: {}", path);

    let yaml_content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_string(),
        source,
    })?;

    debug!("YAML content loaded ({} bytes)", yaml_content.len());

    load_workout_str(&yaml_content)
}

/// Loads a workout from YAML text.
pub fn load_workout_str(yaml_content: &str) -> Result<Workout, LoadError> {
    let definition: WorkoutDefinition = serde_yaml::from_str(yaml_content)?;
    resolve_definition(definition)
}

/// Turns a parsed definition into a playable workout.
pub fn resolve_definition(definition: WorkoutDefinition) -> Result<Workout, LoadError> {
    let WorkoutDefinition {
        name,
        rest_label,
        exercises,
        steps,
    } = definition;

    let raw_steps = match steps {
        StepSource::Compact(text) => parse_steps(&text)?,
        StepSource::Structured(steps) => steps,
    };

    let catalog = ExerciseCatalog::from_exercises(exercises);
    info!(
        "Workout '{}': {} raw steps, {} exercises defined",
        name,
        raw_steps.len(),
        catalog.len()
    );

    let steps = enrich_steps(&raw_steps, &catalog, &rest_label);
    validate_workout(&steps)?;

    Ok(Workout { name, steps })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::model::EnrichedStep;

    #[test]
    fn test_parse_exercise_token() {
        let steps = parse_steps("squat 45").unwrap();
        assert_eq!(steps, vec![WorkoutStep::exercise("squat", 45)]);
    }

    #[test]
    fn test_parse_parenthesized_duration() {
        let steps = parse_steps("squat (45), plank(30)").unwrap();
        assert_eq!(
            steps,
            vec![
                WorkoutStep::exercise("squat", 45),
                WorkoutStep::exercise("plank", 30),
            ]
        );
    }

    #[test]
    fn test_parse_bare_rest_defaults() {
        for token in ["R", "r", "rest", "REST", "Rest"] {
            let steps = parse_steps(token).unwrap();
            assert_eq!(steps, vec![WorkoutStep::rest(DEFAULT_REST_SECONDS)], "token {}", token);
        }
        assert_eq!(DEFAULT_REST_SECONDS, 30);
    }

    #[test]
    fn test_parse_rest_with_duration() {
        assert_eq!(parse_steps("rest 45").unwrap(), vec![WorkoutStep::rest(45)]);
        assert_eq!(parse_steps("R 10").unwrap(), vec![WorkoutStep::rest(10)]);
        assert_eq!(parse_steps("r (20)").unwrap(), vec![WorkoutStep::rest(20)]);
    }

    #[test]
    fn test_parse_preserves_order() {
        let steps = parse_steps("a 10, R, b 20, rest 5, c 30").unwrap();
        assert_eq!(
            steps,
            vec![
                WorkoutStep::exercise("a", 10),
                WorkoutStep::rest(30),
                WorkoutStep::exercise("b", 20),
                WorkoutStep::rest(5),
                WorkoutStep::exercise("c", 30),
            ]
        );
    }

    #[test]
    fn test_parse_id_with_spaces() {
        let steps = parse_steps("jumping jacks 30").unwrap();
        assert_eq!(steps, vec![WorkoutStep::exercise("jumping jacks", 30)]);
    }

    #[test]
    fn test_parse_skips_empty_tokens() {
        let steps = parse_steps(" squat 10 ,, R ,").unwrap();
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse_steps("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_exercise_without_duration() {
        let result = parse_steps("squat 10, plank");
        assert_eq!(
            result,
            Err(ParseError::MalformedToken {
                position: 2,
                token: "plank".to_string()
            })
        );
    }

    #[test]
    fn test_parse_bare_number_is_malformed() {
        assert!(matches!(
            parse_steps("30"),
            Err(ParseError::MalformedToken { position: 1, .. })
        ));
        assert!(matches!(
            parse_steps("(30)"),
            Err(ParseError::MalformedToken { position: 1, .. })
        ));
    }

    #[test]
    fn test_parse_zero_duration_rejected() {
        assert!(matches!(
            parse_steps("squat 0"),
            Err(ParseError::InvalidDuration { position: 1, .. })
        ));
        assert!(matches!(
            parse_steps("rest (0)"),
            Err(ParseError::InvalidDuration { position: 1, .. })
        ));
    }

    #[test]
    fn test_parse_non_numeric_parenthesized_duration() {
        assert!(matches!(
            parse_steps("squat (abc)"),
            Err(ParseError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_parse_error_display() {
        let err = parse_steps("a 10, ???").unwrap_err();
        assert!(err.to_string().contains("Token 2"));
        assert!(err.to_string().contains("???"));
    }

    #[test]
    fn test_load_workout_str_compact() {
        let yaml = r#"
name: Evening
exercises:
  - id: e1
    name: Squat
  - id: e2
    name: Plank
steps: "e1 10, R 5, e2 8"
"#;
        let workout = load_workout_str(yaml).unwrap();
        assert_eq!(workout.name, "Evening");
        assert_eq!(workout.len(), 3);
        assert_eq!(workout.total_duration(), 23);
        assert_eq!(workout.steps[1].name(), "Rest");
    }

    #[test]
    fn test_load_workout_str_structured_with_label() {
        let yaml = r#"
rest_label: Odpoczynek
exercises:
  - id: e1
    name: Squat
steps:
  - type: exercise
    exercise_id: e1
    duration: 20
  - type: rest
    duration: 10
"#;
        let workout = load_workout_str(yaml).unwrap();
        assert_eq!(
            workout.steps[1],
            EnrichedStep::Rest {
                name: "Odpoczynek".to_string(),
                duration: 10
            }
        );
    }

    #[test]
    fn test_load_workout_drops_unknown_exercises() {
        let yaml = r#"
exercises:
  - id: e1
    name: Squat
steps: "e1 10, ghost 20, R"
"#;
        let workout = load_workout_str(yaml).unwrap();
        assert_eq!(workout.len(), 2);
        assert_eq!(workout.steps[0].name(), "Squat");
        assert!(workout.steps[1].is_rest());
    }

    #[test]
    fn test_load_workout_all_unknown_is_empty_error() {
        let yaml = "steps: \"ghost 20, phantom 10\"\n";
        let result = load_workout_str(yaml);
        assert!(matches!(
            result,
            Err(LoadError::Validation(ValidationError::EmptyWorkout))
        ));
    }

    #[test]
    fn test_load_workout_structured_zero_duration() {
        let yaml = r#"
steps:
  - type: rest
    duration: 0
"#;
        let result = load_workout_str(yaml);
        assert!(matches!(
            result,
            Err(LoadError::Validation(ValidationError::ZeroDuration { position: 1, .. }))
        ));
    }

    #[test]
    fn test_load_workout_total_too_long() {
        let result = load_workout_str("steps: \"rest 3000000000, rest 3000000000\"\n");
        assert!(matches!(
            result,
            Err(LoadError::Validation(ValidationError::TooLong {
                total: 6_000_000_000
            }))
        ));
    }

    #[test]
    fn test_load_workout_malformed_token() {
        let yaml = "steps: \"R, !!!\"\n";
        assert!(matches!(load_workout_str(yaml), Err(LoadError::Parse(_))));
    }

    #[test]
    fn test_load_workout_file_not_found() {
        let result = load_workout("/nonexistent/path/workout.yaml");
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_load_workout_invalid_yaml() {
        use tempfile::tempdir;

        let temp_dir = tempdir().unwrap();
        let workout_path = temp_dir.path().join("bad.yaml");
        std::fs::write(&workout_path, "this is not valid yaml: [[[").unwrap();

        let result = load_workout(workout_path.to_str().unwrap());
        assert!(matches!(result, Err(LoadError::Yaml(_))));
    }

    #[test]
    fn test_load_workout_valid_file() {
        use tempfile::tempdir;

        let temp_dir = tempdir().unwrap();
        let workout_path = temp_dir.path().join("reset.yaml");

        let yaml_content = r#"
name: Reset
exercises:
  - id: breath
    name: Box breathing
    note: In, hold, out, hold
steps: "breath 60, rest, breath (60)"
"#;
        std::fs::write(&workout_path, yaml_content).unwrap();

        let workout = load_workout(workout_path.to_str().unwrap()).unwrap();
        assert_eq!(workout.name, "Reset");
        assert_eq!(workout.exercise_count(), 2);
        assert_eq!(workout.total_duration(), 150);
    }
}

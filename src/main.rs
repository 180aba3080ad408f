//! ResetRunner CLI Entry Point
//!
//! Plays a workout file in the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Play a workout
//! resetrunner morning.yaml
//!
//! # With pause control (paused while the file exists)
//! resetrunner morning.yaml /tmp/pause.flag
//!
//! # Preview the resolved steps without playing
//! resetrunner morning.yaml --dry-run
//!
//! # Stream state as JSON lines for another front end
//! resetrunner morning.yaml --json --silent
//! ```
//!
//! While playing, type a command and press Enter:
//! `p` pause/resume, `n` next step, `b` previous step, `q` quit.

use std::env;
use std::io::{self, BufRead};
use std::path::Path;
use std::process::ExitCode;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local};
use colored::Colorize;
use log::{error, info, warn};

use resetrunner::playback::{
    EngineSnapshot, Player, SilentTone, TerminalBell, ThreadScheduler, ToneSink, WorkoutEngine,
};
use resetrunner::workout::{load_workout, EnrichedStep, Workout};
use resetrunner::{APP_NAME, VERSION};

/// Default workout file used when none is specified.
const DEFAULT_WORKOUT: &str = "workout.yaml";

/// Default tick period in milliseconds.
const DEFAULT_TICK_MS: u64 = 1000;

/// Interval for checking the pause flag file and stdin commands.
const PAUSE_CHECK_INTERVAL: Duration = Duration::from_millis(500);

/// Width of the step progress bar.
const BAR_WIDTH: usize = 20;

/// Command-line configuration parsed from arguments.
#[derive(Debug, PartialEq)]
struct Config {
    workout_path: String,
    pause_flag_path: Option<String>,
    dry_run: bool,
    tick_ms: u64,
    json: bool,
    silent: bool,
    verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workout_path: DEFAULT_WORKOUT.to_string(),
            pause_flag_path: None,
            dry_run: false,
            tick_ms: DEFAULT_TICK_MS,
            json: false,
            silent: false,
            verbose: false,
        }
    }
}

/// Interactive command read from stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Toggle,
    Next,
    Previous,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "p" | "pause" | "play" => Some(Self::Toggle),
            "n" | "next" => Some(Self::Next),
            "b" | "back" | "prev" => Some(Self::Previous),
            "q" | "quit" | "exit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints the application banner with version information.
fn print_banner() {
    println!();
    println!("{} v{}", APP_NAME, VERSION);
    println!("Workout Playback Engine");
    println!();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: resetrunner [OPTIONS] <WORKOUT_FILE> [PAUSE_FLAG_PATH]");
    println!();
    println!("Arguments:");
    println!("  <WORKOUT_FILE>      Path to workout YAML file");
    println!("  [PAUSE_FLAG_PATH]   Optional path; playback pauses while it exists");
    println!();
    println!("Options:");
    println!("  --dry-run           Show the resolved steps without playing");
    println!("  --tick-ms N         Tick period in milliseconds (default: {})", DEFAULT_TICK_MS);
    println!("  --json              Print state updates as JSON lines");
    println!("  --silent            Disable tones");
    println!("  --verbose           Enable debug logging");
    println!("  --help              Show this help message");
    println!("  --version           Show version information");
    println!();
    println!("Controls (type and press Enter):");
    println!("  p  pause/resume    n  next step    b  previous step    q  quit");
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();
    let mut positional_index = 0;
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--dry-run" => {
                config.dry_run = true;
            }
            "--json" => {
                config.json = true;
            }
            "--silent" => {
                config.silent = true;
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            "--tick-ms" => {
                i += 1;
                if i >= args.len() {
                    return Err("--tick-ms requires a number argument".to_string());
                }
                config.tick_ms = args[i]
                    .parse::<u64>()
                    .ok()
                    .filter(|ms| *ms > 0)
                    .ok_or_else(|| format!("Invalid tick period: {}", args[i]))?;
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                // Positional argument
                match positional_index {
                    0 => config.workout_path = arg.clone(),
                    1 => config.pause_flag_path = Some(arg.clone()),
                    _ => return Err(format!("Unexpected argument: {}", arg)),
                }
                positional_index += 1;
            }
        }
        i += 1;
    }

    Ok(config)
}

/// Formats seconds as `m:ss`.
fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Builds a fixed-width bar filled to `fraction`.
fn progress_bar(fraction: f64) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * BAR_WIDTH as f64).round()) as usize;
    format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// Renders one status line for a snapshot.
fn format_snapshot(snapshot: &EngineSnapshot) -> String {
    let Some(step) = &snapshot.current_step else {
        return format!(
            "{} {} total",
            "Workout complete".green().bold(),
            format_clock(snapshot.total_elapsed)
        );
    };

    let label = match step {
        EnrichedStep::Exercise { exercise, .. } => format!(
            "[{}/{}] {}",
            snapshot.exercise_step_number, snapshot.total_exercise_steps, exercise.name
        )
        .green()
        .bold(),
        EnrichedStep::Rest { name, .. } => name.blue().bold(),
    };

    let mut line = format!(
        "{} {} |{}| left {}",
        label,
        format_clock(snapshot.time_left_in_current_step),
        progress_bar(snapshot.progress_fraction),
        format_clock(snapshot.total_remaining)
    );

    if let Some(next) = &snapshot.next_step {
        line.push_str(&format!("  next: {}", next.name()).dimmed().to_string());
    }
    if snapshot.is_paused {
        line.push_str(&format!("  {}", "PAUSED".yellow()));
    }
    line
}

/// Prints the resolved workout without playing it.
fn print_plan(workout: &Workout) {
    println!("[DRY RUN] Workout: {}", workout.name);
    println!();

    let mut offset = 0;
    for (index, step) in workout.steps.iter().enumerate() {
        let kind = if step.is_exercise() { "exercise" } else { "rest" };
        println!(
            "  {:>2}. {:<8} {:<24} {:>6}  (at {})",
            index + 1,
            kind,
            step.name(),
            format_clock(step.duration()),
            format_clock(offset)
        );

        if let EnrichedStep::Exercise { exercise, .. } = step {
            if let Some(note) = &exercise.note {
                println!("      note: {}", note);
            }
            if let Some(media) = &exercise.media {
                println!("      media: {}", media);
            }
        }
        offset += step.duration();
    }

    println!();
    println!(
        "Total: {} ({} exercises, {} steps)",
        format_clock(workout.total_duration()),
        workout.exercise_count(),
        workout.len()
    );
}

/// Forwards stdin lines as commands until stdin closes.
fn spawn_command_reader() -> Receiver<Command> {
    let (tx, rx) = channel();

    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match Command::parse(&line) {
                Some(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => warn!("Unknown command '{}' (p, n, b, q)", line.trim()),
            }
        }
    });

    rx
}

/// Prints the closing summary.
fn print_summary(started_at: DateTime<Local>, snapshot: &EngineSnapshot) {
    let finished_at = Local::now();

    println!();
    if snapshot.is_finished {
        println!("{}", "Workout completed".green().bold());
    } else {
        println!("{}", "Workout stopped early".yellow().bold());
    }
    println!("Started:  {}", started_at.format("%H:%M:%S"));
    println!("Ended:    {}", finished_at.format("%H:%M:%S"));
    println!(
        "Played:   {} of {}",
        format_clock(snapshot.total_elapsed),
        format_clock(snapshot.total_workout_duration)
    );
    println!(
        "Exercises: {} of {}",
        snapshot.exercise_step_number, snapshot.total_exercise_steps
    );
}

/// The bell shares stdout with the JSON lines, so it only rings in
/// styled output.
fn rings_bell(config: &Config) -> bool {
    !config.silent && !config.json
}

/// Pause state owned by the pause flag file.
#[derive(Debug, Default)]
struct PauseFlag {
    paused_by_flag: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagChange {
    Pause,
    Resume,
}

impl PauseFlag {
    fn poll(&mut self, present: bool) -> Option<FlagChange> {
        match (present, self.paused_by_flag) {
            (true, false) => {
                self.paused_by_flag = true;
                Some(FlagChange::Pause)
            }
            (false, true) => {
                self.paused_by_flag = false;
                Some(FlagChange::Resume)
            }
            _ => None,
        }
    }

    /// A manual resume hands control back; a flag still present pauses
    /// again on the next poll.
    fn release(&mut self) {
        self.paused_by_flag = false;
    }
}

/// Plays the workout until it finishes or the user quits.
fn play_workout(workout: Workout, config: &Config) -> EngineSnapshot {
    let tone: Box<dyn ToneSink> = if rings_bell(config) {
        Box::new(TerminalBell)
    } else {
        Box::new(SilentTone)
    };

    let json = config.json;
    let engine = WorkoutEngine::with_tone(workout.steps, tone);
    let mut player = Player::new(engine, ThreadScheduler::new())
        .with_period(Duration::from_millis(config.tick_ms))
        .with_observer(move |snapshot| {
            if json {
                match serde_json::to_string(snapshot) {
                    Ok(line) => println!("{}", line),
                    Err(e) => error!("Failed to serialize state: {}", e),
                }
            } else {
                println!("{}", format_snapshot(snapshot));
            }
        });

    let commands = spawn_command_reader();
    let pause_flag = config.pause_flag_path.as_deref().map(Path::new);
    let mut flag_state = PauseFlag::default();

    let mut stdin_open = true;

    player.play();

    while !player.is_finished() {
        let command = if stdin_open {
            match commands.recv_timeout(PAUSE_CHECK_INTERVAL) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => {
                    stdin_open = false;
                    None
                }
            }
        } else {
            thread::sleep(PAUSE_CHECK_INTERVAL);
            None
        };

        match command {
            Some(Command::Toggle) => {
                player.toggle();
                if !player.snapshot().is_paused {
                    flag_state.release();
                }
            }
            Some(Command::Next) => player.skip_to_next(),
            Some(Command::Previous) => player.skip_to_previous(),
            Some(Command::Quit) => {
                info!("Quitting");
                break;
            }
            None => {}
        }

        if let Some(flag) = pause_flag {
            match flag_state.poll(flag.exists()) {
                Some(FlagChange::Pause) => {
                    info!("Pause flag found - pausing");
                    player.pause();
                }
                Some(FlagChange::Resume) => {
                    info!("Pause flag removed - resuming");
                    player.play();
                }
                None => {}
            }
        }
    }

    player.dispose();
    player.snapshot()
}

/// Main application entry point.
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    // Parse arguments
    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    // Setup logging
    setup_logging(config.verbose);

    if !config.json {
        print_banner();
    }

    if let Some(ref path) = config.pause_flag_path {
        info!("Pause control: {}", path);
    }

    // Load workout
    let workout = load_workout(&config.workout_path).map_err(|e| {
        error!("Failed to load workout: {}", e);
        format!(
            "Could not load workout from '{}': {}",
            config.workout_path, e
        )
    })?;

    info!(
        "Workout loaded: {} steps, {} exercises, {}",
        workout.len(),
        workout.exercise_count(),
        format_clock(workout.total_duration())
    );

    if config.dry_run {
        print_plan(&workout);
        return Ok(());
    }

    let started_at = Local::now();
    let final_state = play_workout(workout, &config);

    if !config.json {
        print_summary(started_at, &final_state);
    }

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

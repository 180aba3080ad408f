//! Tone Emission
//!
//! The engine signals step transitions through an injected [`ToneSink`].
//! Tones are fire-and-forget: a failing sink is logged and ignored, it
//! never stops playback.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use log::warn;
use thiserror::Error;

/// Audible cue requested by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneSignal {
    /// A new step has begun
    Start,
    /// The current step ends within a few seconds
    Warn,
}

impl ToneSignal {
    /// Suggested pitch in Hz. The warning is lower than the start cue.
    pub fn frequency_hz(self) -> u32 {
        match self {
            Self::Start => 880,
            Self::Warn => 440,
        }
    }

    /// Suggested length in milliseconds.
    pub fn duration_ms(self) -> u32 {
        match self {
            Self::Start => 300,
            Self::Warn => 150,
        }
    }
}

#[derive(Debug, Error)]
pub enum ToneError {
    #[error("Audio output unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to emit tone: {0}")]
    Io(#[from] io::Error),
}

/// Capability for emitting tones.
pub trait ToneSink: Send {
    /// Emits a single tone.
    fn emit(&self, signal: ToneSignal) -> Result<(), ToneError>;

    fn play_start(&self) -> Result<(), ToneError> {
        self.emit(ToneSignal::Start)
    }

    fn play_warn(&self) -> Result<(), ToneError> {
        self.emit(ToneSignal::Warn)
    }
}

/// Emits a tone and swallows any failure with a logged warning.
pub(crate) fn emit_quietly(sink: &dyn ToneSink, signal: ToneSignal) {
    let result = match signal {
        ToneSignal::Start => sink.play_start(),
        ToneSignal::Warn => sink.play_warn(),
    };

    if let Err(e) = result {
        warn!("Tone {:?} not played: {}", signal, e);
    }
}

/// Discards every tone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentTone;

impl ToneSink for SilentTone {
    fn emit(&self, _signal: ToneSignal) -> Result<(), ToneError> {
        Ok(())
    }
}

/// Rings the terminal bell. Start cues ring twice so they stay
/// distinguishable from warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalBell;

impl ToneSink for TerminalBell {
    fn emit(&self, signal: ToneSignal) -> Result<(), ToneError> {
        let bell: &[u8] = match signal {
            ToneSignal::Start => b"\x07\x07",
            ToneSignal::Warn => b"\x07",
        };

        let mut stdout = io::stdout().lock();
        stdout.write_all(bell)?;
        stdout.flush()?;
        Ok(())
    }
}

/// Records every tone it receives. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingTone {
    played: Arc<Mutex<Vec<ToneSignal>>>,
}

impl RecordingTone {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all tones played so far.
    pub fn played(&self) -> Vec<ToneSignal> {
        self.played
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Counts tones of one kind.
    pub fn count(&self, signal: ToneSignal) -> usize {
        self.played().iter().filter(|s| **s == signal).count()
    }

    pub fn clear(&self) {
        self.played
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl ToneSink for RecordingTone {
    fn emit(&self, signal: ToneSignal) -> Result<(), ToneError> {
        self.played
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(signal);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenTone;

    impl ToneSink for BrokenTone {
        fn emit(&self, _signal: ToneSignal) -> Result<(), ToneError> {
            Err(ToneError::Unavailable("denied by platform policy".to_string()))
        }
    }

    #[test]
    fn test_warn_is_lower_than_start() {
        assert!(ToneSignal::Warn.frequency_hz() < ToneSignal::Start.frequency_hz());
    }

    #[test]
    fn test_recording_tone_shared_between_clones() {
        let recorder = RecordingTone::new();
        let clone = recorder.clone();

        clone.play_start().unwrap();
        clone.play_warn().unwrap();
        recorder.play_warn().unwrap();

        assert_eq!(
            recorder.played(),
            vec![ToneSignal::Start, ToneSignal::Warn, ToneSignal::Warn]
        );
        assert_eq!(recorder.count(ToneSignal::Warn), 2);

        recorder.clear();
        assert!(clone.played().is_empty());
    }

    #[test]
    fn test_silent_tone_succeeds() {
        assert!(SilentTone.play_start().is_ok());
        assert!(SilentTone.play_warn().is_ok());
    }

    #[test]
    fn test_emit_quietly_swallows_errors() {
        emit_quietly(&BrokenTone, ToneSignal::Start);
        emit_quietly(&BrokenTone, ToneSignal::Warn);
    }

    #[test]
    fn test_tone_error_display() {
        let err = ToneError::Unavailable("no device".to_string());
        assert_eq!(err.to_string(), "Audio output unavailable: no device");
    }
}

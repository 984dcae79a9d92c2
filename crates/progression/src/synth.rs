//! Frame matrices to note events.
//!
//! Each track is run-length encoded: consecutive identical frames collapse
//! into one sustained note (melody) or one set of sustained notes (chords).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::frame::FrameMatrix;
use crate::note::{NoteEvent, Song, Track};
use crate::{Error, Result};

/// Highest octave whose B still fits in the MIDI pitch range.
const MAX_OCTAVE: u8 = 8;

/// Settings for turning frames into notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Tempo in beats per minute. Default: 160.
    pub bpm: f64,
    /// One frame lasts `beat_fraction / bpm` seconds. Default 15 makes a
    /// frame a sixteenth note.
    pub beat_fraction: f64,
    /// Octave of melody notes; pitch = pc + 12 * (octave + 1). Default: 5.
    pub melody_octave: u8,
    /// Octave of chord notes. Default: 3.
    pub chord_octave: u8,
    pub velocity: u8,
    /// GM program for the melody. Default: 0 (Acoustic Grand Piano).
    pub melody_program: u8,
    /// GM program for the chords. Default: 1 (Bright Acoustic Piano).
    pub chord_program: u8,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            bpm: 160.0,
            beat_fraction: 15.0,
            melody_octave: 5,
            chord_octave: 3,
            velocity: 100,
            melody_program: 0,
            chord_program: 1,
        }
    }
}

impl SynthConfig {
    /// Seconds per frame.
    pub fn frame_duration(&self) -> f64 {
        self.beat_fraction / self.bpm
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.bpm.is_finite() && self.bpm > 0.0) {
            return Err(Error::InvalidConfig(format!("bpm must be positive, got {}", self.bpm)));
        }
        if !(self.beat_fraction.is_finite() && self.beat_fraction > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "beat_fraction must be positive, got {}",
                self.beat_fraction
            )));
        }
        for (name, octave) in [("melody_octave", self.melody_octave), ("chord_octave", self.chord_octave)] {
            if octave > MAX_OCTAVE {
                return Err(Error::InvalidConfig(format!(
                    "{} must be at most {}, got {}",
                    name, MAX_OCTAVE, octave
                )));
            }
        }
        if self.velocity == 0 || self.velocity > 127 {
            return Err(Error::InvalidConfig(format!(
                "velocity must be 1-127, got {}",
                self.velocity
            )));
        }
        if self.melody_program > 127 || self.chord_program > 127 {
            return Err(Error::InvalidConfig("programs must be 0-127".into()));
        }
        Ok(())
    }
}

fn midi_pitch(pitch_class: u8, octave: u8) -> u8 {
    pitch_class + 12 * (octave + 1)
}

/// A stretch of identical consecutive frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Run<K> {
    pub key: K,
    /// Index of the first frame
    pub start: usize,
    /// Number of frames
    pub length: usize,
}

impl<K> Run<K> {
    /// Index one past the last frame.
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// Run-length state machine over a stream of frame keys.
///
/// `push` returns the run it closes, if any. The run still open when the
/// input ends is only available from `finish`, so callers must always call
/// it.
#[derive(Debug, Clone)]
pub struct RunEncoder<K> {
    current: Option<Run<K>>,
    position: usize,
}

impl<K> Default for RunEncoder<K> {
    fn default() -> Self {
        Self {
            current: None,
            position: 0,
        }
    }
}

impl<K: PartialEq> RunEncoder<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: K) -> Option<Run<K>> {
        let start = self.position;
        self.position += 1;

        if let Some(run) = self.current.as_mut() {
            if run.key == key {
                run.length += 1;
                return None;
            }
        }
        self.current.replace(Run {
            key,
            start,
            length: 1,
        })
    }

    /// Close the open run.
    pub fn finish(self) -> Option<Run<K>> {
        self.current
    }
}

/// All runs of a key sequence, including the final one.
pub fn runs<K: PartialEq>(keys: impl IntoIterator<Item = K>) -> Vec<Run<K>> {
    let mut encoder = RunEncoder::new();
    let mut runs: Vec<Run<K>> = keys.into_iter().filter_map(|k| encoder.push(k)).collect();
    runs.extend(encoder.finish());
    runs
}

/// Melody track: one note per run of the same pitch class. Silent runs
/// emit nothing.
fn melody_notes(melody: &FrameMatrix, config: &SynthConfig) -> Vec<NoteEvent> {
    let duration = config.frame_duration();

    runs((0..melody.len()).map(|t| melody.pitch_class_at(t)))
        .into_iter()
        .filter_map(|run| {
            let pc = run.key?;
            Some(NoteEvent {
                pitch: midi_pitch(pc, config.melody_octave),
                start: run.start as f64 * duration,
                end: run.end() as f64 * duration,
                velocity: config.velocity,
            })
        })
        .collect()
}

/// Chord track: one note per active pitch class per run of the same
/// pitch-class set, all sharing the run's window.
fn chord_notes(chords: &FrameMatrix, config: &SynthConfig) -> Vec<NoteEvent> {
    let duration = config.frame_duration();
    let octave = config.chord_octave;
    let velocity = config.velocity;

    runs((0..chords.len()).map(|t| chords.chroma_at(t)))
        .into_iter()
        .flat_map(|run| {
            let start = run.start as f64 * duration;
            let end = run.end() as f64 * duration;
            run.key.pitch_classes().map(move |pc| NoteEvent {
                pitch: midi_pitch(pc, octave),
                start,
                end,
                velocity,
            })
        })
        .collect()
}

/// Synthesize a melody matrix and a chord matrix of equal length into a
/// two-track song.
pub fn synthesize(melody: &FrameMatrix, chords: &FrameMatrix, config: &SynthConfig) -> Result<Song> {
    config.validate()?;
    melody.ensure_same_len(chords)?;

    let mut melody_track = Track::new("melody", config.melody_program);
    melody_track.notes = melody_notes(melody, config);

    let mut chord_track = Track::new("chords", config.chord_program);
    chord_track.notes = chord_notes(chords, config);

    debug!(
        frames = melody.len(),
        melody_notes = melody_track.notes.len(),
        chord_notes = chord_track.notes.len(),
        "synthesized song"
    );

    Ok(Song {
        melody: melody_track,
        chords: chord_track,
    })
}

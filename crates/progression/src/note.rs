use serde::{Deserialize, Serialize};

/// A single MIDI note with absolute timing in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub pitch: u8,
    pub start: f64,
    pub end: f64,
    pub velocity: u8,
}

impl NoteEvent {
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// One instrument's notes, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    /// General MIDI program number (0-127)
    pub program: u8,
    pub notes: Vec<NoteEvent>,
}

impl Track {
    pub fn new(name: impl Into<String>, program: u8) -> Self {
        Self {
            name: name.into(),
            program,
            notes: Vec::new(),
        }
    }

    pub fn stats(&self) -> TrackStats {
        TrackStats::from_notes(&self.notes)
    }
}

/// A synthesized song: a melody track and a chord track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub melody: Track,
    pub chords: Track,
}

impl Song {
    pub fn tracks(&self) -> [&Track; 2] {
        [&self.melody, &self.chords]
    }

    /// Both tracks merged into one list ordered by start time. Notes that
    /// start together keep melody-before-chord order.
    pub fn timeline(&self) -> Vec<&NoteEvent> {
        let mut notes: Vec<&NoteEvent> = self
            .melody
            .notes
            .iter()
            .chain(self.chords.notes.iter())
            .collect();
        notes.sort_by(|a, b| a.start.total_cmp(&b.start));
        notes
    }

    /// Time the last note ends, in seconds.
    pub fn end_time(&self) -> f64 {
        self.tracks()
            .iter()
            .flat_map(|t| t.notes.iter())
            .map(|n| n.end)
            .fold(0.0, f64::max)
    }
}

/// Statistics about a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackStats {
    pub note_count: usize,
    pub pitch_min: u8,
    pub pitch_max: u8,
    pub mean_pitch: f64,
    /// Fraction of the track's time span covered by notes (0.0–1.0)
    pub coverage: f64,
}

impl TrackStats {
    pub fn from_notes(notes: &[NoteEvent]) -> Self {
        if notes.is_empty() {
            return Self {
                note_count: 0,
                pitch_min: 0,
                pitch_max: 0,
                mean_pitch: 0.0,
                coverage: 0.0,
            };
        }

        let pitch_min = notes.iter().map(|n| n.pitch).min().unwrap_or(0);
        let pitch_max = notes.iter().map(|n| n.pitch).max().unwrap_or(0);
        let mean_pitch =
            notes.iter().map(|n| n.pitch as f64).sum::<f64>() / notes.len() as f64;

        let first_start = notes.iter().map(|n| n.start).fold(f64::INFINITY, f64::min);
        let last_end = notes.iter().map(|n| n.end).fold(0.0, f64::max);
        let span = (last_end - first_start).max(0.0);

        // Chord tracks overlap themselves, so count each distinct window once
        let mut windows: Vec<(f64, f64)> = notes.iter().map(|n| (n.start, n.end)).collect();
        windows.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        windows.dedup();
        let sounding: f64 = windows.iter().map(|(s, e)| (e - s).max(0.0)).sum();

        let coverage = if span > 0.0 {
            (sounding / span).min(1.0)
        } else {
            0.0
        };

        Self {
            note_count: notes.len(),
            pitch_min,
            pitch_max,
            mean_pitch,
            coverage,
        }
    }
}

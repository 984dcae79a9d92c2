//! Chord progressions as frame matrices: nearest-neighbour snapping onto
//! known progressions, and synthesis into MIDI note events.
//!
//! Matrices come in as `FrameMatrix` values (usually loaded through
//! [`dataset`]), get compared against a candidate pool with
//! [`matcher::CandidateMatcher`], and are turned into a two-track [`Song`]
//! by [`synth::synthesize`]. [`midi_writer::song_to_midi`] produces the
//! Standard MIDI File bytes.

pub mod dataset;
pub mod diagnostics;
pub mod frame;
pub mod grouping;
pub mod matcher;
pub mod midi_writer;
pub mod note;
pub mod signatures;
pub mod snap;
pub mod synth;

use std::path::PathBuf;

pub use dataset::Dataset;
pub use diagnostics::{compare_progressions, section_composition, Checkpoints, MappingSummary, SongComparison};
pub use frame::FrameMatrix;
pub use grouping::group_simultaneous;
pub use matcher::{find_nearest, find_nearest_labels_only, Candidate, CandidateMatcher, Metric, NearestMatches};
pub use midi_writer::{song_to_midi, ExportOptions};
pub use note::{NoteEvent, Song, Track, TrackStats};
pub use signatures::SignatureTable;
pub use snap::snap_sections;
pub use synth::{synthesize, SynthConfig};

use chroma_theory::ChromaVector;

/// Errors from progression operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("frame count mismatch: {left} vs {right}")]
    FrameCountMismatch { left: usize, right: usize },

    #[error("song count mismatch: {left} vs {right}")]
    SongCountMismatch { left: usize, right: usize },

    #[error("expected {expected} values, got {actual}")]
    Shape { expected: usize, actual: usize },

    #[error("candidate pool is empty")]
    EmptyPool,

    #[error("pitch class {0} is outside 0-11")]
    InvalidPitchClass(i64),

    #[error("{path}:{line}: {message}")]
    Csv {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("chroma signature {0} is not in the table")]
    UnknownSignature(ChromaVector),

    #[error("signature index {index} is out of range for {len} signatures")]
    SignatureIndex { index: usize, len: usize },

    #[error("invalid setting: {0}")]
    InvalidConfig(String),

    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    CsvFormat(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Chroma(#[from] chroma_theory::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

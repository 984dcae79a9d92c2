//! Chroma vectors and chord labels.
//!
//! A chroma vector marks which of the 12 pitch classes sound in a frame.
//! This crate maps chroma vectors to `(root, quality)` chord labels and back,
//! and holds the static lookup tables that mapping needs: chord templates,
//! interval signatures, pitch names, and modes.
//!
//! ```
//! use chroma_theory::{classify_chord, closest_chord, ChordLabel, ChordQuality, ChromaVector};
//!
//! let chroma: ChromaVector = "100010010000".parse().unwrap();
//! assert_eq!(classify_chord(chroma), ChordLabel::new(0, ChordQuality::Major));
//!
//! let e_major = closest_chord(4, ChordQuality::Major).unwrap();
//! assert_eq!(classify_chord(e_major).to_string(), "EMaj");
//! ```

pub mod chord_templates;
pub mod codec;
pub mod key;
pub mod metrics;
pub mod types;

pub use chord_templates::{template, ChordTemplate, TEMPLATES};
pub use codec::{
    canonical_chords, classify_chord, closest_chord, rotate, ChordClassifier, IntervalClassifier,
    RotationClassifier,
};
pub use key::{
    mode_or_default, note_name, parse_pitch, pitch_or_default, to_major_key, Mode,
};
pub use types::{quality_or_default, ChordLabel, ChordQuality, ChromaVector, PITCH_CLASSES};

/// Errors from building chroma vectors or looking up names.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("chroma vector needs 12 values, got {0}")]
    Length(usize),

    #[error("chroma value {value} at pitch class {index} is not 0 or 1")]
    NonBinary { index: usize, value: f64 },

    #[error("invalid chroma string {0:?}")]
    Parse(String),

    #[error("unknown pitch name {0:?}")]
    UnknownPitch(String),

    #[error("unknown mode {0:?}")]
    UnknownMode(String),
}

pub type Result<T> = std::result::Result<T, Error>;

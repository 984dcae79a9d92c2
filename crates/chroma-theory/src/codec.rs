use crate::chord_templates::{template, INTERVAL_SIGNATURES, TEMPLATES};
use crate::types::{ChordLabel, ChordQuality, ChromaVector, PITCH_CLASSES};

/// Cyclically shift a 12-value vector up by `semitones`: the value at pitch
/// class `i` moves to `(i + semitones) mod 12`.
pub fn rotate<T: Copy>(values: &[T; PITCH_CLASSES], semitones: usize) -> [T; PITCH_CLASSES] {
    let k = semitones % PITCH_CLASSES;
    if k == 0 {
        return *values;
    }
    std::array::from_fn(|i| values[(i + PITCH_CLASSES - k) % PITCH_CLASSES])
}

/// Strategy for turning a chroma vector into a chord label.
pub trait ChordClassifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn classify(&self, chroma: ChromaVector) -> ChordLabel;
}

/// Interval-pattern classifier.
///
/// Computes the cyclic intervals between the sorted active pitch classes and
/// looks for a rotation of that sequence in [`INTERVAL_SIGNATURES`]. The
/// rotation that matches tells which chord tone is the root, so inversions
/// resolve to the same label as root position.
///
/// Empty input is `NonChord`. Single notes, clusters of five or more, and
/// unmatched shapes are `Complex`.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntervalClassifier;

impl ChordClassifier for IntervalClassifier {
    fn name(&self) -> &'static str {
        "interval"
    }

    fn classify(&self, chroma: ChromaVector) -> ChordLabel {
        let notes: Vec<u8> = chroma.pitch_classes().collect();
        match notes.len() {
            0 => ChordLabel::NON_CHORD,
            2..=4 => match_signature(&notes).unwrap_or(ChordLabel::COMPLEX),
            _ => ChordLabel::COMPLEX,
        }
    }
}

/// Distance from each note to the next, wrapping from the highest back to
/// the lowest.
fn cyclic_intervals(notes: &[u8]) -> Vec<u8> {
    notes
        .iter()
        .enumerate()
        .map(|(i, &pc)| {
            let next = notes[(i + 1) % notes.len()];
            (next + 12 - pc) % 12
        })
        .collect()
}

fn match_signature(notes: &[u8]) -> Option<ChordLabel> {
    let intervals = cyclic_intervals(notes);
    let n = intervals.len();

    for signature in INTERVAL_SIGNATURES.iter().filter(|s| s.intervals.len() == n) {
        for offset in 0..n {
            let matches = (0..n).all(|j| intervals[(offset + j) % n] == signature.intervals[j]);
            if matches {
                return Some(ChordLabel::new(notes[offset], signature.quality));
            }
        }
    }
    None
}

/// Brute-force classifier: rotate the input through all twelve offsets and
/// compare exactly against the canonical templates.
///
/// Only the five templated qualities are recognized; anything else,
/// including power chords, comes back as `NonChord`. Used as a reference
/// for checking [`IntervalClassifier`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RotationClassifier;

impl ChordClassifier for RotationClassifier {
    fn name(&self) -> &'static str {
        "rotation"
    }

    fn classify(&self, chroma: ChromaVector) -> ChordLabel {
        for offset in 0..PITCH_CLASSES {
            let shifted = chroma.rotate(offset);
            if let Some(t) = TEMPLATES.iter().find(|t| t.chroma() == shifted) {
                let root = ((PITCH_CLASSES - offset) % PITCH_CLASSES) as u8;
                return ChordLabel::new(root, t.quality);
            }
        }
        ChordLabel::NON_CHORD
    }
}

/// Classify with the interval-pattern strategy.
pub fn classify_chord(chroma: ChromaVector) -> ChordLabel {
    IntervalClassifier.classify(chroma)
}

/// Canonical chroma for a label: the quality's template rotated to `root`.
///
/// `NonChord` is the empty chroma; `Complex` has no canonical pattern.
pub fn closest_chord(root: u8, quality: ChordQuality) -> Option<ChromaVector> {
    match quality {
        ChordQuality::NonChord => Some(ChromaVector::EMPTY),
        ChordQuality::Complex => None,
        q => template(q).map(|t| t.at_root(root % 12)),
    }
}

/// All canonical (label, chroma) pairs for the templated qualities.
pub fn canonical_chords() -> impl Iterator<Item = (ChordLabel, ChromaVector)> {
    TEMPLATES.iter().flat_map(|t| {
        (0..PITCH_CLASSES as u8).map(move |root| (ChordLabel::new(root, t.quality), t.at_root(root)))
    })
}

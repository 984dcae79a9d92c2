//! Snapping continuous predictions onto canonical chords.

use chroma_theory::{canonical_chords, ChordLabel, ChromaVector, PITCH_CLASSES};
use tracing::debug;

use crate::frame::{Frame, FrameMatrix};
use crate::{Error, Result};

/// Canonical chord closest (L1) to a frame. The first of equally close
/// chords wins, in template-then-root order.
pub fn snap_frame(frame: &Frame) -> (ChordLabel, ChromaVector) {
    let mut best = (ChordLabel::NON_CHORD, ChromaVector::EMPTY);
    let mut best_distance = f64::INFINITY;

    for (label, chroma) in canonical_chords() {
        let values = chroma.to_values();
        let d: f64 = frame.iter().zip(values.iter()).map(|(a, b)| (a - b).abs()).sum();
        if d < best_distance {
            best_distance = d;
            best = (label, chroma);
        }
    }
    best
}

fn mean_frame(frames: &[Frame]) -> Frame {
    let mut mean = [0.0; PITCH_CLASSES];
    for frame in frames {
        for (m, v) in mean.iter_mut().zip(frame.iter()) {
            *m += v;
        }
    }
    let n = frames.len().max(1) as f64;
    mean.map(|m| m / n)
}

/// Average every `section_len` frames, snap the average onto its closest
/// canonical chord and hold that chord for the whole section. A shorter
/// final section is averaged over the frames it has.
pub fn snap_sections(prediction: &FrameMatrix, section_len: usize) -> Result<FrameMatrix> {
    if section_len == 0 {
        return Err(Error::InvalidConfig("section length must be positive".into()));
    }

    let mut frames = Vec::with_capacity(prediction.len());
    for section in prediction.frames().chunks(section_len) {
        let (label, chroma) = snap_frame(&mean_frame(section));
        debug!(%label, frames = section.len(), "snapped section");
        let values = chroma.to_values();
        frames.extend(std::iter::repeat(values).take(section.len()));
    }
    Ok(FrameMatrix::new(frames))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chroma_theory::ChordQuality;
    use pretty_assertions::assert_eq;

    #[test]
    fn exact_template_snaps_to_itself() {
        let chroma = ChromaVector::from_pitch_classes(&[2, 5, 9]);
        let (label, snapped) = snap_frame(&chroma.to_values());
        assert_eq!(label, ChordLabel::new(2, ChordQuality::Minor));
        assert_eq!(snapped, chroma);
    }

    #[test]
    fn sections_hold_one_chord() {
        // Eight noisy frames leaning towards G major, then four towards C major
        let mut g = [0.1; 12];
        g[7] = 0.9;
        g[11] = 0.8;
        g[2] = 0.7;
        let mut c = [0.0; 12];
        c[0] = 0.6;
        c[4] = 0.7;
        c[7] = 0.9;

        let mut frames = vec![g; 8];
        frames.extend(vec![c; 4]);
        let snapped = snap_sections(&FrameMatrix::new(frames), 8).unwrap();

        assert_eq!(snapped.len(), 12);
        let g_major = ChromaVector::from_pitch_classes(&[2, 7, 11]);
        let c_major = ChromaVector::from_pitch_classes(&[0, 4, 7]);
        assert!((0..8).all(|t| snapped.chroma_at(t) == g_major));
        assert!((8..12).all(|t| snapped.chroma_at(t) == c_major));
    }

    #[test]
    fn zero_section_length_is_rejected() {
        assert!(snap_sections(&FrameMatrix::default(), 0).is_err());
    }

    #[test]
    fn empty_prediction_stays_empty() {
        assert!(snap_sections(&FrameMatrix::default(), 16).unwrap().is_empty());
    }
}

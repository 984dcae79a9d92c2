use chroma_theory::{classify_chord, ChordLabel, ChromaVector, PITCH_CLASSES};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Values at or above this count as an active pitch class.
pub const ACTIVE_THRESHOLD: f64 = 0.5;

/// One frame of twelve pitch-class values.
pub type Frame = [f64; PITCH_CLASSES];

/// A sequence of frames over the 12 pitch classes.
///
/// Chord and melody data are binary; model predictions are continuous and
/// are turned into chroma with [`FrameMatrix::binarize`] or
/// [`FrameMatrix::top_notes`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameMatrix {
    frames: Vec<Frame>,
}

impl FrameMatrix {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    pub fn from_chroma(chroma: &[ChromaVector]) -> Self {
        Self::new(chroma.iter().map(|c| c.to_values()).collect())
    }

    /// One-hot melody frames; `None` is a silent frame.
    pub fn from_pitch_classes(pitches: &[Option<u8>]) -> Self {
        let frames = pitches
            .iter()
            .map(|pitch| {
                let mut frame = [0.0; PITCH_CLASSES];
                if let Some(pc) = pitch {
                    frame[(*pc % 12) as usize] = 1.0;
                }
                frame
            })
            .collect();
        Self::new(frames)
    }

    /// Build from frame-major values (`values[t * 12 + p]`).
    pub fn from_frame_major(values: &[f64]) -> Result<Self> {
        if values.len() % PITCH_CLASSES != 0 {
            return Err(Error::Shape {
                expected: values.len().next_multiple_of(PITCH_CLASSES),
                actual: values.len(),
            });
        }
        let frames = values
            .chunks_exact(PITCH_CLASSES)
            .map(|chunk| std::array::from_fn(|p| chunk[p]))
            .collect();
        Ok(Self::new(frames))
    }

    /// Build from pitch-major values (`values[p * frames + t]`), the layout
    /// of the chord CSV rows.
    pub fn from_pitch_major(values: &[f64], frames: usize) -> Result<Self> {
        let expected = frames * PITCH_CLASSES;
        if values.len() != expected {
            return Err(Error::Shape {
                expected,
                actual: values.len(),
            });
        }
        let frames = (0..frames)
            .map(|t| std::array::from_fn(|p| values[p * frames + t]))
            .collect();
        Ok(Self::new(frames))
    }

    /// Flatten back to the pitch-major layout.
    pub fn to_pitch_major(&self) -> Vec<f64> {
        let n = self.frames.len();
        let mut values = vec![0.0; n * PITCH_CLASSES];
        for (t, frame) in self.frames.iter().enumerate() {
            for (p, &v) in frame.iter().enumerate() {
                values[p * n + t] = v;
            }
        }
        values
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// All values, frame by frame.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.frames.iter().flat_map(|f| f.iter().copied())
    }

    /// Active pitch classes of a frame.
    pub fn chroma_at(&self, index: usize) -> ChromaVector {
        self.frames
            .get(index)
            .map(frame_chroma)
            .unwrap_or(ChromaVector::EMPTY)
    }

    pub fn chroma_frames(&self) -> Vec<ChromaVector> {
        self.frames.iter().map(frame_chroma).collect()
    }

    /// First active pitch class of a frame, or `None` for silence.
    pub fn pitch_class_at(&self, index: usize) -> Option<u8> {
        self.frames.get(index).and_then(frame_pitch_class)
    }

    /// Chord label of every frame.
    pub fn labels(&self) -> Vec<ChordLabel> {
        self.frames
            .iter()
            .map(|f| classify_chord(frame_chroma(f)))
            .collect()
    }

    /// 0/1 copy with values at or above `threshold` set to 1.
    pub fn binarize(&self, threshold: f64) -> FrameMatrix {
        let frames = self
            .frames
            .iter()
            .map(|f| f.map(|v| if v >= threshold { 1.0 } else { 0.0 }))
            .collect();
        Self::new(frames)
    }

    /// 0/1 copy keeping the `n` strongest pitch classes of every frame.
    ///
    /// Only positive values are kept; ties go to the lower pitch class.
    pub fn top_notes(&self, n: usize) -> FrameMatrix {
        let frames = self
            .frames
            .iter()
            .map(|f| {
                let mut order: Vec<usize> = (0..PITCH_CLASSES).collect();
                order.sort_by(|&a, &b| f[b].total_cmp(&f[a]));
                let mut out = [0.0; PITCH_CLASSES];
                for &p in order.iter().take(n).filter(|&&p| f[p] > 0.0) {
                    out[p] = 1.0;
                }
                out
            })
            .collect();
        Self::new(frames)
    }

    pub fn ensure_same_len(&self, other: &FrameMatrix) -> Result<()> {
        if self.len() != other.len() {
            return Err(Error::FrameCountMismatch {
                left: self.len(),
                right: other.len(),
            });
        }
        Ok(())
    }
}

fn frame_chroma(frame: &Frame) -> ChromaVector {
    let flags = frame.map(|v| v >= ACTIVE_THRESHOLD);
    ChromaVector::from_flags(&flags)
}

fn frame_pitch_class(frame: &Frame) -> Option<u8> {
    frame
        .iter()
        .position(|&v| v >= ACTIVE_THRESHOLD)
        .map(|p| p as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chroma_theory::ChordQuality;

    #[test]
    fn pitch_major_layout() {
        // Two frames: frame 0 has C, frame 1 has D
        let mut values = vec![0.0; 24];
        values[0] = 1.0; // p=0, t=0
        values[2 * 2 + 1] = 1.0; // p=2, t=1
        let matrix = FrameMatrix::from_pitch_major(&values, 2).unwrap();

        assert_eq!(matrix.pitch_class_at(0), Some(0));
        assert_eq!(matrix.pitch_class_at(1), Some(2));
        assert_eq!(matrix.to_pitch_major(), values);
    }

    #[test]
    fn pitch_major_wrong_width() {
        let err = FrameMatrix::from_pitch_major(&[0.0; 23], 2).unwrap_err();
        assert!(matches!(err, Error::Shape { expected: 24, actual: 23 }));
    }

    #[test]
    fn frame_major_layout() {
        let mut values = vec![0.0; 24];
        values[12 + 7] = 1.0;
        let matrix = FrameMatrix::from_frame_major(&values).unwrap();
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix.pitch_class_at(0), None);
        assert_eq!(matrix.pitch_class_at(1), Some(7));
        assert!(FrameMatrix::from_frame_major(&[0.0; 13]).is_err());
    }

    #[test]
    fn labels_per_frame() {
        let chroma = [
            ChromaVector::from_pitch_classes(&[0, 4, 7]),
            ChromaVector::EMPTY,
        ];
        let labels = FrameMatrix::from_chroma(&chroma).labels();
        assert_eq!(labels[0], ChordLabel::new(0, ChordQuality::Major));
        assert_eq!(labels[1], ChordLabel::NON_CHORD);
    }

    #[test]
    fn top_notes_picks_strongest() {
        let frame = [0.9, 0.0, 0.1, 0.0, 0.7, 0.0, 0.0, 0.8, 0.0, 0.0, 0.05, 0.0];
        let top = FrameMatrix::new(vec![frame]).top_notes(3);
        assert_eq!(top.chroma_at(0), ChromaVector::from_pitch_classes(&[0, 4, 7]));
    }

    #[test]
    fn top_notes_skips_zeros() {
        let mut frame = [0.0; 12];
        frame[5] = 0.4;
        let top = FrameMatrix::new(vec![frame]).top_notes(3);
        assert_eq!(top.chroma_at(0), ChromaVector::from_pitch_classes(&[5]));
    }

    #[test]
    fn binarize_threshold() {
        let frame = [0.6, 0.4, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        let bin = FrameMatrix::new(vec![frame]).binarize(0.5);
        assert_eq!(bin.chroma_at(0), ChromaVector::from_pitch_classes(&[0, 2, 11]));
    }
}

//! Text diagnostics for matched progressions.

use std::fmt;

use chroma_theory::{classify_chord, ChordLabel, PITCH_CLASSES};
use serde::{Deserialize, Serialize};

use crate::frame::FrameMatrix;
use crate::matcher::{Metric, NearestMatches};
use crate::{Error, Result};

/// Which frames a progression comparison samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Checkpoints {
    /// Frames between checkpoints. Default: 16 (one bar of sixteenths).
    pub stride: usize,
    /// Number of checkpoints. Default: 8.
    pub count: usize,
}

impl Default for Checkpoints {
    fn default() -> Self {
        Self { stride: 16, count: 8 }
    }
}

impl Checkpoints {
    /// Checkpoint frame indices that exist in a song of `len` frames.
    pub fn frames(&self, len: usize) -> impl Iterator<Item = usize> {
        let stride = self.stride.max(1);
        (0..self.count).map(move |i| i * stride).take_while(move |&t| t < len)
    }
}

/// Reference and predicted chords of one song at each checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct SongComparison {
    pub song: usize,
    pub reference: Vec<ChordLabel>,
    pub predicted: Vec<ChordLabel>,
    /// L1 difference of the two frames at each checkpoint
    pub diffs: Vec<f64>,
}

impl SongComparison {
    pub fn total(&self) -> f64 {
        self.diffs.iter().sum()
    }
}

impl fmt::Display for SongComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "song {}\t answ:", self.song)?;
        for label in &self.reference {
            write!(f, "{}\t", label)?;
        }
        writeln!(f)?;
        writeln!(f, "song {}\t pred:", self.song)?;
        for label in &self.predicted {
            write!(f, "{}\t", label)?;
        }
        writeln!(f)?;
        writeln!(f, "song {}\t diff:", self.song)?;
        for d in &self.diffs {
            write!(f, "{}\t", d)?;
        }
        writeln!(f)?;
        writeln!(f, "{}", self.total())
    }
}

fn frame_label(matrix: &FrameMatrix, t: usize) -> ChordLabel {
    classify_chord(matrix.chroma_at(t))
}

/// Compare reference and predicted progressions song by song at the
/// checkpoint frames.
pub fn compare_progressions(
    reference: &[FrameMatrix],
    predicted: &[FrameMatrix],
    checkpoints: Checkpoints,
) -> Result<Vec<SongComparison>> {
    if reference.len() != predicted.len() {
        return Err(Error::SongCountMismatch {
            left: reference.len(),
            right: predicted.len(),
        });
    }

    reference
        .iter()
        .zip(predicted)
        .enumerate()
        .map(|(song, (answer, pred))| -> Result<SongComparison> {
            answer.ensure_same_len(pred)?;
            let mut comparison = SongComparison {
                song,
                reference: Vec::new(),
                predicted: Vec::new(),
                diffs: Vec::new(),
            };
            for t in checkpoints.frames(answer.len()) {
                comparison.reference.push(frame_label(answer, t));
                comparison.predicted.push(frame_label(pred, t));
                let diff = match (answer.frame(t), pred.frame(t)) {
                    (Some(a), Some(b)) => a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum(),
                    _ => 0.0,
                };
                comparison.diffs.push(diff);
            }
            Ok(comparison)
        })
        .collect()
}

/// How well a nearest-neighbour run reproduced the reference songs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingSummary {
    /// Distinct pool indices among all top-N choices
    pub unique_indices: usize,
    /// Number of songs matched
    pub total: usize,
    /// Distance between matched and reference songs, per frame per song
    pub norm: f64,
}

impl MappingSummary {
    pub fn from_matches(matches: &NearestMatches, reference: &[FrameMatrix], metric: Metric) -> Result<Self> {
        if matches.len() != reference.len() {
            return Err(Error::SongCountMismatch {
                left: reference.len(),
                right: matches.len(),
            });
        }

        let unique_indices = matches.unique_indices();
        let total = reference.len();

        let frames = reference.first().map(FrameMatrix::len).unwrap_or(0);
        let mut sum = 0.0;
        for (matched, answer) in matches.matched.iter().zip(reference) {
            sum += match metric {
                Metric::L1 => Metric::L1.distance(matched, answer)?,
                Metric::L2 => Metric::L2.distance(matched, answer)?.powi(2),
            };
        }
        let whole = match metric {
            Metric::L1 => sum,
            Metric::L2 => sum.sqrt(),
        };
        let norm = if frames == 0 || total == 0 {
            0.0
        } else {
            whole / frames as f64 / total as f64
        };

        Ok(Self {
            unique_indices,
            total,
            norm,
        })
    }
}

impl fmt::Display for MappingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "num of unique idx  = {}/{}", self.unique_indices, self.total)?;
        write!(f, "norm after mapping = {:.3}", self.norm)
    }
}

/// Per section, a histogram of 13 bins: bin 0 counts silent frames, bin
/// `pc + 1` counts frames whose strongest pitch class is `pc`.
pub fn section_composition(melody: &FrameMatrix, section_len: usize) -> Result<Vec<[usize; PITCH_CLASSES + 1]>> {
    if section_len == 0 {
        return Err(Error::InvalidConfig("section length must be positive".into()));
    }

    Ok(melody
        .frames()
        .chunks(section_len)
        .map(|section| {
            let mut bins = [0usize; PITCH_CLASSES + 1];
            for frame in section {
                let (pc, max) = frame
                    .iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
                if max <= 0.0 {
                    bins[0] += 1;
                } else {
                    bins[pc + 1] += 1;
                }
            }
            bins
        })
        .collect())
}

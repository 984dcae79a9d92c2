//! Per-frame comparisons between chroma vectors.

use crate::types::ChromaVector;

/// Number of pitch classes on in one vector and off in the other.
pub fn hamming(a: ChromaVector, b: ChromaVector) -> u32 {
    (a.mask() ^ b.mask()).count_ones()
}

/// Pitch classes active in both vectors.
pub fn intersection(a: ChromaVector, b: ChromaVector) -> ChromaVector {
    ChromaVector::from_mask(a.mask() & b.mask())
}

/// F1 score of `candidate` against `reference`, treating each active pitch
/// class as a prediction.
///
/// Precision is shared notes over candidate notes, recall is shared notes
/// over reference notes. Empty vectors give 0.0 rather than NaN.
pub fn overlap_f1(reference: ChromaVector, candidate: ChromaVector) -> f64 {
    let shared = intersection(reference, candidate).len() as f64;
    let precision = ratio(shared, candidate.len() as f64);
    let recall = ratio(shared, reference.len() as f64);
    ratio(2.0 * precision * recall, precision + recall)
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chroma(pcs: &[u8]) -> ChromaVector {
        ChromaVector::from_pitch_classes(pcs)
    }

    #[test]
    fn hamming_counts_differences() {
        // C major vs A minor share C and E
        assert_eq!(hamming(chroma(&[0, 4, 7]), chroma(&[9, 0, 4])), 2);
        assert_eq!(hamming(chroma(&[0, 4, 7]), chroma(&[0, 4, 7])), 0);
    }

    #[test]
    fn intersection_keeps_common_notes() {
        assert_eq!(intersection(chroma(&[0, 4, 7]), chroma(&[9, 0, 4])), chroma(&[0, 4]));
    }

    #[test]
    fn f1_of_partial_overlap() {
        // 2 shared of 3 each: p = r = 2/3
        let f1 = overlap_f1(chroma(&[0, 4, 7]), chroma(&[9, 0, 4]));
        assert!((f1 - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn f1_with_empty_inputs_is_zero() {
        assert_eq!(overlap_f1(ChromaVector::EMPTY, chroma(&[0, 4, 7])), 0.0);
        assert_eq!(overlap_f1(chroma(&[0, 4, 7]), ChromaVector::EMPTY), 0.0);
        assert_eq!(overlap_f1(ChromaVector::EMPTY, ChromaVector::EMPTY), 0.0);
        // Disjoint: precision and recall both zero
        assert_eq!(overlap_f1(chroma(&[0]), chroma(&[1])), 0.0);
    }
}

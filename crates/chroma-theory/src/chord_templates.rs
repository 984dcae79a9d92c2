use crate::types::{ChordQuality, ChromaVector};

/// A chord template: quality enum + interval set from root (as bitmask over 12 pitch classes).
pub struct ChordTemplate {
    pub quality: ChordQuality,
    pub suffix: &'static str,
    pub intervals: u16, // bitmask: bit i set means interval i is in the template
    pub size: usize,
}

impl ChordTemplate {
    const fn new(quality: ChordQuality, suffix: &'static str, intervals: &[u8]) -> Self {
        let mut mask = 0u16;
        let mut i = 0;
        while i < intervals.len() {
            mask |= 1 << intervals[i];
            i += 1;
        }
        Self {
            quality,
            suffix,
            intervals: mask,
            size: intervals.len(),
        }
    }

    /// The template's chroma at root C.
    pub fn chroma(&self) -> ChromaVector {
        ChromaVector::from_mask(self.intervals)
    }

    /// The template transposed to `root`.
    pub fn at_root(&self, root: u8) -> ChromaVector {
        self.chroma().rotate(root as usize)
    }
}

/// The canonical chord shapes at root C.
pub static TEMPLATES: &[ChordTemplate] = &[
    ChordTemplate::new(ChordQuality::Major, "Maj", &[0, 4, 7]),
    ChordTemplate::new(ChordQuality::Minor, "Min", &[0, 3, 7]),
    ChordTemplate::new(ChordQuality::Major7, "Maj7", &[0, 4, 7, 11]),
    ChordTemplate::new(ChordQuality::Dominant7, "7", &[0, 4, 7, 10]),
    ChordTemplate::new(ChordQuality::Minor7, "Min7", &[0, 3, 7, 10]),
];

/// Root + fifth. Recognized by interval pattern only, never by exact
/// template comparison.
pub static POWER_TEMPLATE: ChordTemplate = ChordTemplate::new(ChordQuality::Power, "5", &[0, 7]);

/// Template for a quality; `None` for the sentinels.
pub fn template(quality: ChordQuality) -> Option<&'static ChordTemplate> {
    if quality == ChordQuality::Power {
        return Some(&POWER_TEMPLATE);
    }
    TEMPLATES.iter().find(|t| t.quality == quality)
}

/// Cyclic interval signature of a chord shape in root position.
///
/// Each entry is the distance from one chord tone to the next, the last one
/// wrapping back to the root, so every signature sums to 12. An inversion of
/// the same shape produces a rotation of the signature.
pub struct IntervalSignature {
    pub quality: ChordQuality,
    pub intervals: &'static [u8],
}

pub static INTERVAL_SIGNATURES: &[IntervalSignature] = &[
    IntervalSignature { quality: ChordQuality::Major, intervals: &[4, 3, 5] },
    IntervalSignature { quality: ChordQuality::Minor, intervals: &[3, 4, 5] },
    IntervalSignature { quality: ChordQuality::Major7, intervals: &[4, 3, 4, 1] },
    IntervalSignature { quality: ChordQuality::Dominant7, intervals: &[4, 3, 3, 2] },
    IntervalSignature { quality: ChordQuality::Minor7, intervals: &[3, 4, 3, 2] },
    IntervalSignature { quality: ChordQuality::Power, intervals: &[7, 5] },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c_major_template_bits() {
        let major = template(ChordQuality::Major).unwrap();
        assert_eq!(major.chroma().to_string(), "100010010000");
        assert_eq!(major.size, 3);
    }

    #[test]
    fn sentinels_have_no_template() {
        assert!(template(ChordQuality::NonChord).is_none());
        assert!(template(ChordQuality::Complex).is_none());
    }

    #[test]
    fn at_root_transposes() {
        let minor = template(ChordQuality::Minor).unwrap();
        // A minor: A C E
        assert_eq!(minor.at_root(9), ChromaVector::from_pitch_classes(&[9, 0, 4]));
    }

    #[test]
    fn signatures_agree_with_templates() {
        for signature in INTERVAL_SIGNATURES {
            assert_eq!(signature.intervals.iter().map(|&i| i as u32).sum::<u32>(), 12);

            let mut pcs = vec![0u8];
            for &step in &signature.intervals[..signature.intervals.len() - 1] {
                pcs.push(pcs.last().unwrap() + step);
            }
            let built = ChromaVector::from_pitch_classes(&pcs);
            let expected = template(signature.quality).unwrap().chroma();
            assert_eq!(built, expected, "{:?}", signature.quality);
        }
    }
}

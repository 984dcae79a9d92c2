use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::key::note_name;
use crate::{Error, Result};

/// Number of pitch classes in a chroma vector.
pub const PITCH_CLASSES: usize = 12;

const CHROMA_MASK: u16 = 0x0FFF;

/// Twelve binary pitch-class flags. Bit `i` is pitch class `i` (C = 0).
///
/// Serialized as a 12-character `0`/`1` string with C first, the same key
/// format the one-hot signature tables use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChromaVector(u16);

impl ChromaVector {
    pub const EMPTY: ChromaVector = ChromaVector(0);

    pub const fn from_mask(mask: u16) -> Self {
        Self(mask & CHROMA_MASK)
    }

    pub const fn mask(self) -> u16 {
        self.0
    }

    pub fn from_pitch_classes(pitch_classes: &[u8]) -> Self {
        let mask = pitch_classes
            .iter()
            .fold(0u16, |mask, &pc| mask | 1 << (pc % 12));
        Self(mask)
    }

    /// Build from numeric values, rejecting wrong lengths and anything
    /// other than exact 0 or 1.
    pub fn try_from_values(values: &[f64]) -> Result<Self> {
        if values.len() != PITCH_CLASSES {
            return Err(Error::Length(values.len()));
        }

        let mut mask = 0u16;
        for (index, &value) in values.iter().enumerate() {
            if value == 1.0 {
                mask |= 1 << index;
            } else if value != 0.0 {
                return Err(Error::NonBinary { index, value });
            }
        }
        Ok(Self(mask))
    }

    pub fn from_flags(flags: &[bool; PITCH_CLASSES]) -> Self {
        let mask = flags
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .fold(0u16, |mask, (i, _)| mask | 1 << i);
        Self(mask)
    }

    pub fn to_values(self) -> [f64; PITCH_CLASSES] {
        std::array::from_fn(|i| if self.contains(i as u8) { 1.0 } else { 0.0 })
    }

    pub fn contains(self, pitch_class: u8) -> bool {
        pitch_class < 12 && self.0 & (1 << pitch_class) != 0
    }

    /// Number of active pitch classes.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Active pitch classes in ascending order.
    pub fn pitch_classes(self) -> impl Iterator<Item = u8> {
        (0..PITCH_CLASSES as u8).filter(move |&pc| self.contains(pc))
    }

    /// Shift every active pitch class up by `semitones` (mod 12).
    pub fn rotate(self, semitones: usize) -> Self {
        let k = (semitones % PITCH_CLASSES) as u32;
        if k == 0 {
            return self;
        }
        let mask = self.0 as u32;
        let rotated = (mask << k) | (mask >> (PITCH_CLASSES as u32 - k));
        Self(rotated as u16 & CHROMA_MASK)
    }
}

impl fmt::Display for ChromaVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pc in 0..PITCH_CLASSES as u8 {
            f.write_str(if self.contains(pc) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for ChromaVector {
    type Err = Error;

    /// Accepts `100010010000` as well as bracketed or separated forms such
    /// as `[1 0 0 0 1 0 0 1 0 0 0 0]` or `1,0,0,0,1,0,0,1,0,0,0,0`.
    fn from_str(s: &str) -> Result<Self> {
        let digits: Vec<char> = s
            .chars()
            .filter(|c| !c.is_whitespace() && !matches!(c, ',' | '[' | ']' | '.'))
            .collect();

        if digits.len() != PITCH_CLASSES || digits.iter().any(|c| !matches!(c, '0' | '1')) {
            return Err(Error::Parse(s.to_string()));
        }

        let mask = digits
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == '1')
            .fold(0u16, |mask, (i, _)| mask | 1 << i);
        Ok(Self(mask))
    }
}

impl TryFrom<String> for ChromaVector {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ChromaVector> for String {
    fn from(value: ChromaVector) -> Self {
        value.to_string()
    }
}

/// Chord quality, with the numeric codes used by the chord data files.
///
/// `NonChord` and `Complex` are sentinels for "nothing sounding" and
/// "sounding but not a recognized shape". They are outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    NonChord = 0,
    Major = 1,
    Minor = 2,
    Major7 = 3,
    Dominant7 = 4,
    Minor7 = 5,
    Complex = 6,
    Power = 7,
}

impl ChordQuality {
    pub const ALL: [ChordQuality; 8] = [
        ChordQuality::NonChord,
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Major7,
        ChordQuality::Dominant7,
        ChordQuality::Minor7,
        ChordQuality::Complex,
        ChordQuality::Power,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Suffix for chord symbol display
    pub fn suffix(&self) -> &'static str {
        match self {
            ChordQuality::Major => "Maj",
            ChordQuality::Minor => "Min",
            ChordQuality::Major7 => "Maj7",
            ChordQuality::Dominant7 => "7",
            ChordQuality::Minor7 => "Min7",
            ChordQuality::Power => "5",
            ChordQuality::NonChord | ChordQuality::Complex => "",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChordQuality::NonChord => "Non-chord",
            ChordQuality::Major => "Maj",
            ChordQuality::Minor => "Min",
            ChordQuality::Major7 => "Maj7",
            ChordQuality::Dominant7 => "Dominant7",
            ChordQuality::Minor7 => "Min7",
            ChordQuality::Complex => "Complex",
            ChordQuality::Power => "Power",
        }
    }

    /// False for the `NonChord` / `Complex` sentinels.
    pub fn is_recognized(self) -> bool {
        !matches!(self, ChordQuality::NonChord | ChordQuality::Complex)
    }
}

impl fmt::Display for ChordQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Look up a quality by numeric code, falling back to `NonChord`.
pub fn quality_or_default(code: u8) -> ChordQuality {
    ChordQuality::from_code(code).unwrap_or_else(|| {
        warn!(code, "no chord quality for code, using non-chord");
        ChordQuality::NonChord
    })
}

/// A chord identified by root pitch class and quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChordLabel {
    /// Pitch class 0–11 (C=0, C#=1, ...)
    pub root: u8,
    pub quality: ChordQuality,
}

impl ChordLabel {
    pub const NON_CHORD: ChordLabel = ChordLabel {
        root: 0,
        quality: ChordQuality::NonChord,
    };

    pub const COMPLEX: ChordLabel = ChordLabel {
        root: 0,
        quality: ChordQuality::Complex,
    };

    pub fn new(root: u8, quality: ChordQuality) -> Self {
        Self {
            root: root % 12,
            quality,
        }
    }

    pub fn is_recognized(&self) -> bool {
        self.quality.is_recognized()
    }
}

impl fmt::Display for ChordLabel {
    /// Chord symbol such as `CMaj`, `AMin7`, `G7`; `N` when unrecognized.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_recognized() {
            write!(f, "{}{}", note_name(self.root, false), self.quality.suffix())
        } else {
            f.write_str("N")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chroma_string_round_trip() {
        let c_major: ChromaVector = "100010010000".parse().unwrap();
        assert_eq!(c_major, ChromaVector::from_pitch_classes(&[0, 4, 7]));
        assert_eq!(c_major.to_string(), "100010010000");
    }

    #[test]
    fn parses_numpy_style_key() {
        let chroma: ChromaVector = "[1 0 0 0 1 0 0 1 0 0 0 0]".parse().unwrap();
        assert_eq!(chroma.pitch_classes().collect::<Vec<_>>(), vec![0, 4, 7]);

        let floats: ChromaVector = "[ 1. 0. 0. 1. 0. 0. 0. 1. 0. 0. 0. 0.]".parse().unwrap();
        assert_eq!(floats.pitch_classes().collect::<Vec<_>>(), vec![0, 3, 7]);
    }

    #[test]
    fn rejects_bad_strings() {
        assert!("10001001000".parse::<ChromaVector>().is_err());
        assert!("10001001000x".parse::<ChromaVector>().is_err());
    }

    #[test]
    fn values_must_be_binary_and_twelve_long() {
        assert_eq!(
            ChromaVector::try_from_values(&[1.0; 11]),
            Err(Error::Length(11))
        );

        let mut values = [0.0; 12];
        values[3] = 0.5;
        assert_eq!(
            ChromaVector::try_from_values(&values),
            Err(Error::NonBinary {
                index: 3,
                value: 0.5
            })
        );
    }

    #[test]
    fn rotate_wraps_high_bits() {
        // B (11) shifted up one semitone lands on C (0)
        let b = ChromaVector::from_pitch_classes(&[11]);
        assert_eq!(b.rotate(1), ChromaVector::from_pitch_classes(&[0]));
    }

    #[test]
    fn quality_codes_match_data_files() {
        assert_eq!(ChordQuality::NonChord.code(), 0);
        assert_eq!(ChordQuality::Minor7.code(), 5);
        assert_eq!(ChordQuality::Complex.code(), 6);
        assert_eq!(ChordQuality::Power.code(), 7);
        assert_eq!(ChordQuality::from_code(4), Some(ChordQuality::Dominant7));
        assert_eq!(ChordQuality::from_code(8), None);
        assert_eq!(quality_or_default(42), ChordQuality::NonChord);
    }

    #[test]
    fn label_display() {
        assert_eq!(ChordLabel::new(0, ChordQuality::Major).to_string(), "CMaj");
        assert_eq!(ChordLabel::new(9, ChordQuality::Minor7).to_string(), "AMin7");
        assert_eq!(ChordLabel::new(7, ChordQuality::Dominant7).to_string(), "G7");
        assert_eq!(ChordLabel::COMPLEX.to_string(), "N");
        assert_eq!(ChordLabel::NON_CHORD.to_string(), "N");
    }

    #[test]
    fn chroma_serializes_as_string() {
        let chroma = ChromaVector::from_pitch_classes(&[2, 5, 9]);
        let json = serde_json::to_string(&chroma).unwrap();
        assert_eq!(json, "\"001001000100\"");
        let back: ChromaVector = serde_json::from_str(&json).unwrap();
        assert_eq!(back, chroma);
    }
}

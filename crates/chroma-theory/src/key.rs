use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Error, Result};

const NOTE_NAMES_SHARP: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
const NOTE_NAMES_FLAT: [&str; 12] = ["C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B"];

/// Pitch classes conventionally spelled with flats.
pub static FLAT_KEY_ROOTS: [u8; 6] = [1, 3, 5, 6, 8, 10]; // Db, Eb, F, Gb, Ab, Bb

pub fn note_name(pitch_class: u8, use_flats: bool) -> &'static str {
    let idx = (pitch_class % 12) as usize;
    if use_flats {
        NOTE_NAMES_FLAT[idx]
    } else {
        NOTE_NAMES_SHARP[idx]
    }
}

/// Parse a pitch name (`"C"`, `"F#"`, `"Bb"`) to its pitch class.
pub fn parse_pitch(name: &str) -> Result<u8> {
    let name = name.trim();
    NOTE_NAMES_SHARP
        .iter()
        .position(|&n| n == name)
        .or_else(|| NOTE_NAMES_FLAT.iter().position(|&n| n == name))
        .map(|pc| pc as u8)
        .ok_or_else(|| Error::UnknownPitch(name.to_string()))
}

/// Parse a pitch name, falling back to C (0) with a warning.
pub fn pitch_or_default(name: &str) -> u8 {
    parse_pitch(name).unwrap_or_else(|err| {
        warn!(%err, "pitch lookup failed, using C");
        0
    })
}

/// Sharp-spelled name for a pitch class index, falling back to `"C"`.
pub fn pitch_name_or_default(index: usize) -> &'static str {
    match NOTE_NAMES_SHARP.get(index) {
        Some(name) => *name,
        None => {
            warn!(index, "no pitch name for index, using C");
            "C"
        }
    }
}

/// The seven diatonic modes, indexed in the order the key data files use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Major = 0,
    Minor = 1,
    Dorian = 2,
    Phrygian = 3,
    Lydian = 4,
    Mixolydian = 5,
    Locrian = 6,
}

impl Mode {
    pub const ALL: [Mode; 7] = [
        Mode::Major,
        Mode::Minor,
        Mode::Dorian,
        Mode::Phrygian,
        Mode::Lydian,
        Mode::Mixolydian,
        Mode::Locrian,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: usize) -> Option<Mode> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Major => "Major",
            Mode::Minor => "Minor",
            Mode::Dorian => "Dorian",
            Mode::Phrygian => "Phrygian",
            Mode::Lydian => "Lydian",
            Mode::Mixolydian => "Mixolydian",
            Mode::Locrian => "Locrian",
        }
    }

    /// Semitones from a tonic in this mode up to the tonic of the major key
    /// sharing its pitch collection.
    pub fn major_offset(self) -> u8 {
        match self {
            Mode::Major => 0,
            Mode::Minor => 3,
            Mode::Dorian => 10,
            Mode::Phrygian => 8,
            Mode::Lydian => 7,
            Mode::Mixolydian => 5,
            Mode::Locrian => 1,
        }
    }
}

impl FromStr for Mode {
    type Err = Error;

    /// Case-insensitive. `Locryan` is accepted for Locrian since older key
    /// annotations spell it that way.
    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        if name.eq_ignore_ascii_case("locryan") {
            return Ok(Mode::Locrian);
        }
        Mode::ALL
            .iter()
            .copied()
            .find(|mode| mode.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::UnknownMode(name.to_string()))
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse a mode name, falling back to Major with a warning.
pub fn mode_or_default(name: &str) -> Mode {
    name.parse().unwrap_or_else(|err: Error| {
        warn!(%err, "mode lookup failed, using major");
        Mode::Major
    })
}

/// Mode for an index, falling back to Major with a warning.
pub fn mode_from_index_or_default(index: usize) -> Mode {
    Mode::from_index(index).unwrap_or_else(|| {
        warn!(index, "no mode for index, using major");
        Mode::Major
    })
}

/// Transpose a modal key to the major key with the same pitch collection.
///
/// A minor becomes C major, D dorian becomes C major, and so on.
pub fn to_major_key(key: u8, mode: Mode) -> (u8, Mode) {
    ((key % 12 + mode.major_offset()) % 12, Mode::Major)
}

/// Key name in display form, e.g. `"Eb Dorian"`.
pub fn key_name(key: u8, mode: Mode) -> String {
    let use_flats = FLAT_KEY_ROOTS.contains(&(key % 12));
    format!("{} {}", note_name(key, use_flats), mode)
}

//! CSV datasets of paired chord and melody progressions.
//!
//! Both files hold one song per row and no header.
//!
//! - Chord rows carry `12 * frames` values in pitch-major order
//!   (`value[p * frames + t]`).
//! - Melody rows carry `frames` dense pitch-class indices (0-11), expanded
//!   to one-hot frames on load.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use chroma_theory::PITCH_CLASSES;
use tracing::{debug, info};

use crate::frame::FrameMatrix;
use crate::{Error, Result};

/// Songs split into a test set (the first `nb_test` rows) and a training
/// set (the rest).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub train_melody: Vec<FrameMatrix>,
    pub train_chords: Vec<FrameMatrix>,
    pub test_melody: Vec<FrameMatrix>,
    pub test_chords: Vec<FrameMatrix>,
}

impl Dataset {
    pub fn load(chord_path: &Path, melody_path: &Path, frames: usize, nb_test: usize) -> Result<Self> {
        let mut chords = read_chord_csv(chord_path, frames)?;
        let mut melody = read_melody_csv(melody_path, frames)?;

        if chords.len() != melody.len() {
            return Err(Error::Csv {
                path: melody_path.to_path_buf(),
                line: chords.len().min(melody.len()) + 1,
                message: format!(
                    "{} melody rows but {} chord rows in {}",
                    melody.len(),
                    chords.len(),
                    chord_path.display()
                ),
            });
        }
        if nb_test > chords.len() {
            return Err(Error::InvalidConfig(format!(
                "nb_test {} exceeds the {} songs available",
                nb_test,
                chords.len()
            )));
        }

        let train_chords = chords.split_off(nb_test);
        let train_melody = melody.split_off(nb_test);
        let dataset = Self {
            train_melody,
            train_chords,
            test_melody: melody,
            test_chords: chords,
        };

        info!(
            train = dataset.train_len(),
            test = dataset.test_len(),
            frames,
            "loaded dataset"
        );
        Ok(dataset)
    }

    pub fn train_len(&self) -> usize {
        self.train_chords.len()
    }

    pub fn test_len(&self) -> usize {
        self.test_chords.len()
    }
}

/// Numeric CSV records with their 1-based line numbers.
fn parse_rows<R: io::Read>(input: R, path: &Path) -> Result<Vec<(usize, Vec<f64>)>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, &e))?;
        let line = record.position().map_or(0, |pos| pos.line() as usize);
        let values: Vec<f64> = record.deserialize(None).map_err(|e| Error::Csv {
            path: path.to_path_buf(),
            line,
            message: e.to_string(),
        })?;
        rows.push((line, values));
    }
    Ok(rows)
}

fn csv_error(path: &Path, err: &csv::Error) -> Error {
    Error::Csv {
        path: path.to_path_buf(),
        line: err.position().map_or(0, |pos| pos.line() as usize),
        message: err.to_string(),
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn check_width(path: &Path, line: usize, values: &[f64], expected: usize) -> Result<()> {
    if values.len() != expected {
        return Err(Error::Csv {
            path: path.to_path_buf(),
            line,
            message: format!("expected {} values, got {}", expected, values.len()),
        });
    }
    Ok(())
}

/// Parse chord rows from CSV text. `path` only labels errors.
pub fn parse_chord_csv(text: &str, path: &Path, frames: usize) -> Result<Vec<FrameMatrix>> {
    read_chord_rows(text.as_bytes(), path, frames)
}

fn read_chord_rows<R: io::Read>(input: R, path: &Path, frames: usize) -> Result<Vec<FrameMatrix>> {
    let width = frames * PITCH_CLASSES;
    parse_rows(input, path)?
        .into_iter()
        .map(|(line, values)| {
            check_width(path, line, &values, width)?;
            FrameMatrix::from_pitch_major(&values, frames)
        })
        .collect()
}

/// Parse dense melody rows from CSV text. `path` only labels errors.
pub fn parse_melody_csv(text: &str, path: &Path, frames: usize) -> Result<Vec<FrameMatrix>> {
    read_melody_rows(text.as_bytes(), path, frames)
}

fn read_melody_rows<R: io::Read>(input: R, path: &Path, frames: usize) -> Result<Vec<FrameMatrix>> {
    parse_rows(input, path)?
        .into_iter()
        .map(|(line, values)| -> Result<FrameMatrix> {
            check_width(path, line, &values, frames)?;
            let pitches = values
                .iter()
                .map(|&v| {
                    if v.fract() != 0.0 || !(0.0..PITCH_CLASSES as f64).contains(&v) {
                        return Err(Error::Csv {
                            path: path.to_path_buf(),
                            line,
                            message: Error::InvalidPitchClass(v as i64).to_string(),
                        });
                    }
                    Ok(Some(v as u8))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(FrameMatrix::from_pitch_classes(&pitches))
        })
        .collect()
}

pub fn read_chord_csv(path: &Path, frames: usize) -> Result<Vec<FrameMatrix>> {
    let songs = read_chord_rows(open(path)?, path, frames)?;
    debug!(path = %path.display(), songs = songs.len(), "read chord csv");
    Ok(songs)
}

pub fn read_melody_csv(path: &Path, frames: usize) -> Result<Vec<FrameMatrix>> {
    let songs = read_melody_rows(open(path)?, path, frames)?;
    debug!(path = %path.display(), songs = songs.len(), "read melody csv");
    Ok(songs)
}

fn write_chord_rows<W: io::Write>(output: W, matrices: &[FrameMatrix]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(output);
    for matrix in matrices {
        writer.write_record(
            matrix
                .to_pitch_major()
                .iter()
                .map(|v| (v.round() as i64).to_string()),
        )?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Chord rows as CSV text, values rounded to integers.
pub fn format_chord_csv(matrices: &[FrameMatrix]) -> Result<String> {
    let mut out = Vec::new();
    write_chord_rows(&mut out, matrices)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Write chord matrices in the layout `read_chord_csv` expects, creating
/// parent directories as needed.
pub fn write_chord_csv(path: &Path, matrices: &[FrameMatrix]) -> Result<()> {
    let io_err = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = File::create(path).map_err(io_err)?;
    write_chord_rows(file, matrices)?;
    debug!(path = %path.display(), songs = matrices.len(), "wrote chord csv");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chroma_theory::ChromaVector;
    use pretty_assertions::assert_eq;

    fn p() -> &'static Path {
        Path::new("test.csv")
    }

    #[test]
    fn chord_rows_are_pitch_major() {
        // Two frames: C major then A minor
        let mut values = vec![0; 24];
        for pc in [0, 4, 7] {
            values[pc * 2] = 1;
        }
        for pc in [9, 0, 4] {
            values[pc * 2 + 1] = 1;
        }
        let row: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        let songs = parse_chord_csv(&row.join(","), p(), 2).unwrap();

        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].chroma_at(0), ChromaVector::from_pitch_classes(&[0, 4, 7]));
        assert_eq!(songs[0].chroma_at(1), ChromaVector::from_pitch_classes(&[0, 4, 9]));
        assert_eq!(format_chord_csv(&songs).unwrap(), format!("{}\n", row.join(",")));
    }

    #[test]
    fn melody_rows_expand_to_one_hot() {
        let songs = parse_melody_csv("0,0,7\n11.0,2,2\n", p(), 3).unwrap();
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[0].pitch_class_at(2), Some(7));
        assert_eq!(songs[1].pitch_class_at(0), Some(11));
        assert_eq!(songs[1].chroma_at(1).len(), 1);
    }

    #[test]
    fn bad_melody_value_names_line() {
        let err = parse_melody_csv("0,1,2\n0,12,2\n", p(), 3).unwrap_err();
        match err {
            Error::Csv { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("12"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn wrong_width_names_line() {
        let err = parse_chord_csv("1,0,0,0,1,0,0,1,0,0,0,0\n1,0\n", p(), 1).unwrap_err();
        assert!(matches!(err, Error::Csv { line: 2, .. }));
    }

    #[test]
    fn blank_lines_and_padding_are_ignored() {
        let songs = parse_melody_csv("\n 0, 4 ,7\n\n", p(), 3).unwrap();
        assert_eq!(songs.len(), 1);
        assert_eq!(songs[0].pitch_class_at(1), Some(4));
    }

    #[test]
    fn non_numeric_field() {
        assert!(matches!(
            parse_melody_csv("0,x,2", p(), 3),
            Err(Error::Csv { line: 1, .. })
        ));
    }

    #[test]
    fn load_splits_test_rows() {
        let dir = tempfile::tempdir().unwrap();
        let chords = (0..3)
            .map(|pc| FrameMatrix::from_chroma(&[ChromaVector::from_pitch_classes(&[pc]); 2]))
            .collect::<Vec<_>>();
        let chord_path = dir.path().join("data/chord.csv");
        write_chord_csv(&chord_path, &chords).unwrap();
        let melody_path = dir.path().join("melody.csv");
        fs::write(&melody_path, "0,1\n2,3\n4,5\n").unwrap();

        let dataset = Dataset::load(&chord_path, &melody_path, 2, 1).unwrap();
        assert_eq!(dataset.test_len(), 1);
        assert_eq!(dataset.train_len(), 2);
        assert_eq!(dataset.test_chords[0], chords[0]);
        assert_eq!(dataset.train_chords, chords[1..].to_vec());
        assert_eq!(dataset.train_melody[1].pitch_class_at(1), Some(5));

        assert!(matches!(
            Dataset::load(&chord_path, &melody_path, 2, 4),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn load_rejects_row_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let chord_path = dir.path().join("chord.csv");
        write_chord_csv(&chord_path, &[FrameMatrix::from_chroma(&[ChromaVector::EMPTY])]).unwrap();
        let melody_path = dir.path().join("melody.csv");
        fs::write(&melody_path, "0\n1\n").unwrap();

        assert!(matches!(
            Dataset::load(&chord_path, &melody_path, 1, 0),
            Err(Error::Csv { line: 2, .. })
        ));
    }
}

//! End-to-end tests over the CSV fixtures in tests/fixtures/.
//!
//! Three 32-frame songs: song 0 is the test set, songs 1 and 2 the pool.
//! Song 0 differs from song 1 only in its last frame (G7 instead of G).

use std::path::{Path, PathBuf};

use chroma_theory::{ChordLabel, ChordQuality, ChromaVector};
use midly::{MidiMessage, Smf, TrackEventKind};
use pretty_assertions::assert_eq;
use progression::dataset::write_chord_csv;
use progression::{
    compare_progressions, find_nearest, find_nearest_labels_only, group_simultaneous, snap_sections,
    song_to_midi, synthesize, Checkpoints, Dataset, ExportOptions, FrameMatrix, MappingSummary, Metric,
    SignatureTable, SynthConfig,
};

const FRAMES: usize = 32;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

fn load() -> Dataset {
    Dataset::load(&fixture("chord.csv"), &fixture("melody.csv"), FRAMES, 1)
        .unwrap_or_else(|e| panic!("Failed to load fixtures: {}", e))
}

#[test]
fn fixtures_split_into_test_and_train() {
    let dataset = load();
    assert_eq!(dataset.test_len(), 1);
    assert_eq!(dataset.train_len(), 2);
    assert_eq!(dataset.test_melody[0].pitch_class_at(8), Some(9));

    let last = dataset.test_chords[0].chroma_at(FRAMES - 1);
    assert_eq!(last, ChromaVector::from_pitch_classes(&[7, 11, 2, 5]));
}

#[test]
fn test_song_snaps_onto_its_neighbour() {
    let dataset = load();
    let matches = find_nearest(&dataset.test_chords, &dataset.train_chords, Metric::L1, 2).unwrap();

    assert_eq!(matches.best_indices, vec![vec![0, 1]]);
    assert_eq!(matches.distances, vec![1.0]);
    assert_eq!(matches.matched[0], dataset.train_chords[0]);

    let labels_only = find_nearest_labels_only(&dataset.test_chords, &dataset.train_chords, 2).unwrap();
    assert_eq!(labels_only, matches.best_indices);

    let summary = MappingSummary::from_matches(&matches, &dataset.test_chords, Metric::L1).unwrap();
    assert_eq!(summary.unique_indices, 2);
    assert_eq!(summary.total, 1);
    assert_eq!(summary.norm, 1.0 / FRAMES as f64);
}

#[test]
fn checkpoint_report_shows_the_difference() {
    let dataset = load();
    let matches = find_nearest(&dataset.test_chords, &dataset.train_chords, Metric::L2, 1).unwrap();
    let checkpoints = Checkpoints { stride: 8, count: 4 };
    let report = compare_progressions(&dataset.test_chords, &matches.matched, checkpoints).unwrap();

    let labels: Vec<String> = report[0].reference.iter().map(ToString::to_string).collect();
    assert_eq!(labels, vec!["CMaj", "AMin", "FMaj", "GMaj"]);
    // The G7 frame falls between checkpoints
    assert_eq!(report[0].total(), 0.0);
}

#[test]
fn melody_and_chords_become_midi() {
    let dataset = load();
    let config = SynthConfig::default();
    let song = synthesize(&dataset.test_melody[0], &dataset.test_chords[0], &config).unwrap();

    // C E A F A G
    let pitches: Vec<u8> = song.melody.notes.iter().map(|n| n.pitch).collect();
    assert_eq!(pitches, vec![72, 76, 81, 77, 81, 79]);
    assert_eq!(song.melody.notes.last().map(|n| n.end), Some(FRAMES as f64 * config.frame_duration()));

    // Four triads, then G for 7 frames, then G7 for the final frame
    let groups = group_simultaneous(&song.chords.notes).unwrap();
    assert_eq!(groups.iter().map(Vec::len).collect::<Vec<_>>(), vec![3, 3, 3, 3, 4]);

    let bytes = song_to_midi(&song, &ExportOptions::for_synth(&config)).unwrap();
    let smf = Smf::parse(&bytes).unwrap();
    assert_eq!(smf.tracks.len(), 3);

    let note_ons = smf.tracks[2]
        .iter()
        .filter(|e| {
            matches!(
                e.kind,
                TrackEventKind::Midi { message: MidiMessage::NoteOn { vel, .. }, .. } if vel.as_int() > 0
            )
        })
        .count();
    assert_eq!(note_ons, song.chords.notes.len());
}

#[test]
fn signature_table_covers_the_pool() {
    let dataset = load();
    let table = SignatureTable::build(&dataset.train_chords);
    assert_eq!(table.len(), 4);

    for song in &dataset.train_chords {
        let indices = table.encode(song).unwrap();
        assert_eq!(&table.decode(&indices).unwrap(), song);
    }
    // G7 never occurs in the pool
    assert!(table.encode(&dataset.test_chords[0]).is_err());
}

#[test]
fn noisy_prediction_snaps_to_templates() {
    let dataset = load();
    let clean = &dataset.train_chords[0];
    let noisy: Vec<[f64; 12]> = clean
        .frames()
        .iter()
        .enumerate()
        .map(|(t, frame)| frame.map(|v| if v > 0.0 { 0.8 - (t % 3) as f64 * 0.1 } else { 0.15 }))
        .collect();

    let snapped = snap_sections(&FrameMatrix::new(noisy), 8).unwrap();
    assert_eq!(&snapped, clean);
    assert_eq!(snapped.labels()[8], ChordLabel::new(9, ChordQuality::Minor));
}

#[test]
fn written_csv_reloads() {
    let dataset = load();
    let dir = tempfile::tempdir().unwrap();
    let chord_path = dir.path().join("out").join("chord.csv");
    write_chord_csv(&chord_path, &dataset.train_chords).unwrap();

    let melody_path = dir.path().join("melody.csv");
    let row = vec!["0"; FRAMES].join(",");
    std::fs::write(&melody_path, format!("{row}\n{row}\n")).unwrap();

    let reloaded = Dataset::load(&chord_path, &melody_path, FRAMES, 0).unwrap();
    assert_eq!(reloaded.train_chords, dataset.train_chords);
}

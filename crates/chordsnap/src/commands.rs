//! CLI command implementations

use std::path::Path;

use anyhow::{bail, Context, Result};
use chroma_theory::key::key_name;
use chroma_theory::{parse_pitch, to_major_key, ChordClassifier, ChromaVector, IntervalClassifier, Mode, RotationClassifier};
use progression::dataset::{read_chord_csv, read_melody_csv, write_chord_csv};
use progression::{
    compare_progressions, find_nearest, section_composition, snap_sections, song_to_midi, synthesize,
    ExportOptions, MappingSummary, Metric, SignatureTable,
};
use tracing::info;

use crate::config::{ChordsnapConfig, ConfigSources};
use crate::Strategy;

/// Print the chord label of each chroma string.
pub fn classify(chroma: &[String], strategy: Strategy) -> Result<()> {
    let classifier: Box<dyn ChordClassifier> = match strategy {
        Strategy::Interval => Box::new(IntervalClassifier),
        Strategy::Rotation => Box::new(RotationClassifier),
    };

    for input in chroma {
        let vector: ChromaVector = input
            .parse()
            .with_context(|| format!("Invalid chroma vector '{}'", input))?;
        let label = classifier.classify(vector);
        println!("{}\t{}\t{}", vector, label, label.quality.name());
    }
    Ok(())
}

/// Synthesize one song row and write it as MIDI.
pub fn synth(
    config: &ChordsnapConfig,
    melody: &Path,
    chords: &Path,
    row: usize,
    out: &Path,
    composition: bool,
) -> Result<()> {
    let frames = config.data.frames;
    let melodies = read_melody_csv(melody, frames).context("Failed to read melody CSV")?;
    let progressions = read_chord_csv(chords, frames).context("Failed to read chord CSV")?;

    let Some(melody_row) = melodies.get(row) else {
        bail!("Row {} out of range: {} has {} songs", row, melody.display(), melodies.len());
    };
    let Some(chord_row) = progressions.get(row) else {
        bail!("Row {} out of range: {} has {} songs", row, chords.display(), progressions.len());
    };

    let song = synthesize(melody_row, chord_row, &config.synth)?;
    let bytes = song_to_midi(&song, &ExportOptions::for_synth(&config.synth))?;
    std::fs::write(out, &bytes).with_context(|| format!("Failed to write {}", out.display()))?;

    let melody_stats = song.melody.stats();
    info!(
        row,
        bytes = bytes.len(),
        path = %out.display(),
        pitch_min = melody_stats.pitch_min,
        pitch_max = melody_stats.pitch_max,
        coverage = melody_stats.coverage,
        "wrote MIDI"
    );
    println!(
        "Wrote {}: {} melody notes, {} chord notes, {:.2}s",
        out.display(),
        song.melody.notes.len(),
        song.chords.notes.len(),
        song.end_time()
    );

    if composition {
        let section_len = config.diagnostics.stride;
        for (i, bins) in section_composition(melody_row, section_len)?.iter().enumerate() {
            let counts: Vec<String> = bins.iter().map(|c| c.to_string()).collect();
            println!("section {}\t{}", i, counts.join("\t"));
        }
    }
    Ok(())
}

/// Options for the `match` command beyond the configured defaults.
pub struct MatchArgs<'a> {
    pub pred: &'a Path,
    pub pool: &'a Path,
    pub truth: Option<&'a Path>,
    pub metric: Metric,
    pub top_n: usize,
    /// Keep only the N strongest pitch classes of each predicted frame
    pub top_notes: Option<usize>,
    /// Snap predictions onto canonical chords, one per section of this many frames
    pub snap: Option<usize>,
    pub report: bool,
    pub out: Option<&'a Path>,
}

/// Snap predicted progressions onto the pool and summarize the mapping.
pub fn match_pool(config: &ChordsnapConfig, args: MatchArgs<'_>) -> Result<()> {
    let frames = config.data.frames;
    let mut predictions = read_chord_csv(args.pred, frames).context("Failed to read prediction CSV")?;
    if let Some(n) = args.top_notes {
        predictions = predictions.iter().map(|p| p.top_notes(n)).collect();
    }
    if let Some(section_len) = args.snap {
        predictions = predictions
            .iter()
            .map(|p| snap_sections(p, section_len))
            .collect::<progression::Result<Vec<_>>>()?;
    }
    let pool = read_chord_csv(args.pool, frames).context("Failed to read pool CSV")?;

    let matches = find_nearest(&predictions, &pool, args.metric, args.top_n)?;

    // Without ground truth, measure how far each prediction had to move
    let reference = match args.truth {
        Some(path) => read_chord_csv(path, frames).context("Failed to read truth CSV")?,
        None => predictions,
    };

    if args.report {
        for comparison in compare_progressions(&reference, &matches.matched, config.diagnostics)? {
            println!("{}", comparison);
        }
    }

    let summary = MappingSummary::from_matches(&matches, &reference, args.metric)?;
    println!("Metric: {}", args.metric);
    println!("{}", summary);

    if let Some(out) = args.out {
        write_chord_csv(out, &matches.matched)?;
        println!("Wrote {} matched songs to {}", matches.len(), out.display());
    }
    Ok(())
}

/// Print the major key sharing a modal key's pitch collection.
pub fn key(key: &str, mode: &str) -> Result<()> {
    let root = parse_pitch(key)?;
    let mode: Mode = mode.parse()?;
    let (major, major_mode) = to_major_key(root, mode);
    println!("{} -> {}", key_name(root, mode), key_name(major, major_mode));
    Ok(())
}

/// Build the one-hot signature table of a chord CSV.
pub fn signatures(config: &ChordsnapConfig, chords: &Path, out: &Path) -> Result<()> {
    let songs = read_chord_csv(chords, config.data.frames).context("Failed to read chord CSV")?;
    let table = SignatureTable::build(&songs);
    table.save(out)?;
    println!("Wrote {} signatures to {}", table.len(), out.display());
    Ok(())
}

/// Print the effective configuration and where it came from.
pub fn show_config(config: &ChordsnapConfig, sources: &ConfigSources) -> Result<()> {
    println!("# Files loaded:");
    if sources.files.is_empty() {
        println!("#   (none, using defaults)");
    }
    for path in &sources.files {
        println!("#   {}", path.display());
    }
    if !sources.env_overrides.is_empty() {
        println!("# Environment overrides: {}", sources.env_overrides.join(", "));
    }
    println!();
    print!("{}", config.to_toml()?);
    Ok(())
}

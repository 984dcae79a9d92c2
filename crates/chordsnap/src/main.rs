//! chordsnap - chord labels, progression snapping and MIDI synthesis
//!
//! Subcommands:
//! - `chordsnap classify <CHROMA>...` - Label chroma vectors
//! - `chordsnap synth` - Render one melody/chord row to MIDI
//! - `chordsnap match` - Snap predicted progressions onto a pool
//! - `chordsnap key <KEY> <MODE>` - Relative major key
//! - `chordsnap signatures` - Build the one-hot signature table
//! - `chordsnap config` - Show the effective configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use progression::Metric;

mod commands;
mod config;
mod telemetry;

use config::ChordsnapConfig;

#[derive(Parser)]
#[command(name = "chordsnap")]
#[command(about = "Chord labelling, progression snapping and MIDI synthesis")]
#[command(version)]
struct Cli {
    /// Config file, used instead of ./chordsnap.toml
    #[arg(long, global = true, env = "CHORDSNAP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Chord classification strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Interval-pattern matching (handles inversions, power chords)
    Interval,
    /// Exhaustive rotation against the five templates
    Rotation,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MetricArg {
    L1,
    L2,
}

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::L1 => Metric::L1,
            MetricArg::L2 => Metric::L2,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Label 12-character chroma strings such as 100010010000
    Classify {
        #[arg(required = true)]
        chroma: Vec<String>,

        #[arg(short, long, value_enum, default_value = "interval")]
        strategy: Strategy,
    },

    /// Synthesize one song row to a MIDI file
    Synth {
        /// Melody CSV (dense pitch classes)
        #[arg(long)]
        melody: PathBuf,

        /// Chord CSV (pitch-major binary rows)
        #[arg(long)]
        chords: PathBuf,

        /// Song row to render
        #[arg(long, default_value = "0")]
        row: usize,

        /// Output MIDI path
        #[arg(short, long)]
        out: PathBuf,

        /// Print the melody's per-section pitch-class histogram
        #[arg(long)]
        composition: bool,
    },

    /// Snap predicted progressions onto their nearest pool entries
    Match {
        /// Predicted progressions (chord CSV layout, continuous values allowed)
        #[arg(long)]
        pred: PathBuf,

        /// Candidate pool (chord CSV)
        #[arg(long)]
        pool: PathBuf,

        /// Ground-truth progressions to score against
        #[arg(long)]
        truth: Option<PathBuf>,

        /// Distance metric [default: from config]
        #[arg(long, value_enum)]
        metric: Option<MetricArg>,

        /// Top-N indices kept per query [default: from config]
        #[arg(long)]
        top: Option<usize>,

        /// Keep the N strongest pitch classes of each predicted frame
        #[arg(long)]
        top_notes: Option<usize>,

        /// Snap predictions onto canonical chords, one per N-frame section
        #[arg(long)]
        snap: Option<usize>,

        /// Print the per-song checkpoint report
        #[arg(long)]
        report: bool,

        /// Write matched progressions as chord CSV
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show the major key that shares a modal key's notes
    Key {
        /// Tonic, e.g. A, F#, Bb
        key: String,

        /// Mode, e.g. minor, dorian
        mode: String,
    },

    /// Build the one-hot chord signature table of a chord CSV
    Signatures {
        #[arg(long)]
        chords: PathBuf,

        /// Output JSON path
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Print the effective configuration and its sources
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sources) = ChordsnapConfig::load_with_sources(cli.config.as_deref())
        .context("Failed to load configuration")?;

    telemetry::init(&config.log_level);

    match cli.command {
        Commands::Classify { chroma, strategy } => {
            commands::classify(&chroma, strategy)?;
        }
        Commands::Synth {
            melody,
            chords,
            row,
            out,
            composition,
        } => {
            commands::synth(&config, &melody, &chords, row, &out, composition)?;
        }
        Commands::Match {
            pred,
            pool,
            truth,
            metric,
            top,
            top_notes,
            snap,
            report,
            out,
        } => {
            commands::match_pool(
                &config,
                commands::MatchArgs {
                    pred: &pred,
                    pool: &pool,
                    truth: truth.as_deref(),
                    metric: metric.map(Metric::from).unwrap_or(config.matcher.metric),
                    top_n: top.unwrap_or(config.matcher.top_n),
                    top_notes,
                    snap,
                    report,
                    out: out.as_deref(),
                },
            )?;
        }
        Commands::Key { key, mode } => {
            commands::key(&key, &mode)?;
        }
        Commands::Signatures { chords, out } => {
            commands::signatures(&config, &chords, &out)?;
        }
        Commands::Config => {
            commands::show_config(&config, &sources)?;
        }
    }

    Ok(())
}

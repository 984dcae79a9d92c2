use serde::{Deserialize, Serialize};

use crate::note::{Song, Track};
use crate::synth::SynthConfig;
use crate::{Error, Result};

/// Options for MIDI export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Ticks per quarter note. Default: 480.
    pub ppq: u16,
    /// Tempo written to the tempo track and used to convert seconds to
    /// ticks. Default: 160.
    pub bpm: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { ppq: 480, bpm: 160.0 }
    }
}

impl ExportOptions {
    /// Export at the tempo the song was synthesized with.
    pub fn for_synth(config: &SynthConfig) -> Self {
        Self {
            bpm: config.bpm,
            ..Self::default()
        }
    }

    fn seconds_to_ticks(&self, seconds: f64) -> u64 {
        (seconds.max(0.0) * self.bpm / 60.0 * self.ppq as f64).round() as u64
    }

    fn microseconds_per_beat(&self) -> u32 {
        ((60_000_000.0 / self.bpm).round() as u32).min(0x00FF_FFFF)
    }
}

/// Write a song to Standard MIDI File format 1 bytes.
///
/// Track 0: tempo. Track 1: melody on channel 0. Track 2: chords on
/// channel 1.
pub fn song_to_midi(song: &Song, options: &ExportOptions) -> Result<Vec<u8>> {
    if !(options.bpm.is_finite() && options.bpm > 0.0) {
        return Err(Error::InvalidConfig(format!("bpm must be positive, got {}", options.bpm)));
    }
    if options.ppq == 0 || options.ppq > 0x7FFF {
        return Err(Error::InvalidConfig(format!("ppq must be 1-32767, got {}", options.ppq)));
    }

    let tracks = vec![
        build_tempo_track(options),
        build_song_track(&song.melody, 0, options),
        build_song_track(&song.chords, 1, options),
    ];

    Ok(build_midi_file(options.ppq, &tracks))
}

fn build_tempo_track(options: &ExportOptions) -> Vec<u8> {
    let usec = options.microseconds_per_beat();
    let mut track_data = Vec::new();

    write_vlq(&mut track_data, 0);
    track_data.extend_from_slice(&[
        0xFF,
        0x51,
        0x03,
        (usec >> 16) as u8,
        (usec >> 8) as u8,
        usec as u8,
    ]);
    // 4/4
    write_vlq(&mut track_data, 0);
    track_data.extend_from_slice(&[0xFF, 0x58, 0x04, 4, 2, 0x18, 0x08]);

    write_vlq(&mut track_data, 0);
    track_data.extend_from_slice(&[0xFF, 0x2F, 0x00]);

    track_data
}

fn build_song_track(track: &Track, channel: u8, options: &ExportOptions) -> Vec<u8> {
    let channel = channel & 0x0F;
    let mut events: Vec<(u64, Vec<u8>)> = Vec::new();

    let name_bytes = track.name.as_bytes();
    let mut name_event = vec![0xFF, 0x03];
    write_vlq(&mut name_event, name_bytes.len() as u32);
    name_event.extend_from_slice(name_bytes);
    events.push((0, name_event));

    events.push((0, vec![0xC0 | channel, track.program & 0x7F]));

    for note in &track.notes {
        let on = options.seconds_to_ticks(note.start);
        let off = options.seconds_to_ticks(note.end).max(on);
        events.push((on, vec![0x90 | channel, note.pitch & 0x7F, note.velocity & 0x7F]));
        events.push((off, vec![0x80 | channel, note.pitch & 0x7F, 0]));
    }

    // Stable: same-tick events keep emission order apart from offs going first
    events.sort_by(|a, b| {
        a.0.cmp(&b.0).then_with(|| {
            let a_is_off = a.1.first().is_some_and(|b| b & 0xF0 == 0x80);
            let b_is_off = b.1.first().is_some_and(|b| b & 0xF0 == 0x80);
            b_is_off.cmp(&a_is_off)
        })
    });

    let mut track_data = Vec::new();
    let mut last_tick = 0u64;

    for (tick, data) in events {
        let delta = tick.saturating_sub(last_tick);
        write_vlq(&mut track_data, delta as u32);
        track_data.extend_from_slice(&data);
        last_tick = tick;
    }

    write_vlq(&mut track_data, 0);
    track_data.extend_from_slice(&[0xFF, 0x2F, 0x00]);

    track_data
}

fn build_midi_file(ppq: u16, tracks: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = Vec::new();

    buf.extend_from_slice(b"MThd");
    buf.extend_from_slice(&6u32.to_be_bytes());
    buf.extend_from_slice(&1u16.to_be_bytes()); // format 1
    buf.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    buf.extend_from_slice(&ppq.to_be_bytes());

    for track_data in tracks {
        buf.extend_from_slice(b"MTrk");
        buf.extend_from_slice(&(track_data.len() as u32).to_be_bytes());
        buf.extend_from_slice(track_data);
    }

    buf
}

/// Variable-length quantity, most significant group first.
fn write_vlq(buf: &mut Vec<u8>, mut value: u32) {
    let mut groups = [0u8; 5];
    let mut n = 0;
    loop {
        groups[n] = (value & 0x7F) as u8;
        n += 1;
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let continuation = if i > 0 { 0x80 } else { 0 };
        buf.push(groups[i] | continuation);
    }
}

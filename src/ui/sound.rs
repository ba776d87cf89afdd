/// Sound engine: procedural 8-bit style sound effects via rodio.
///
/// Every effect is a short list of tones (optionally mixed with noise),
/// synthesised into an in-memory WAV buffer once at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

use std::f32::consts::PI;

use crate::sim::event::GameEvent;

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const SAMPLE_RATE: u32 = 22050;

/// One sound effect per kind of game outcome worth hearing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sfx {
    Bump,
    Treasure,
    Trap,
    Hit,
    Death,
    Exit,
}

impl Sfx {
    #[cfg_attr(not(feature = "sound"), allow(dead_code))]
    pub const ALL: [Sfx; 6] = [Sfx::Bump, Sfx::Treasure, Sfx::Trap, Sfx::Hit, Sfx::Death, Sfx::Exit];

    /// Which effect (if any) an event should trigger.
    pub fn for_event(event: &GameEvent) -> Option<Sfx> {
        match event {
            GameEvent::MoveBlocked { .. } => Some(Sfx::Bump),
            GameEvent::TreasureFound { .. } => Some(Sfx::Treasure),
            GameEvent::TrapTriggered { .. } => Some(Sfx::Trap),
            GameEvent::EnemyCollision { .. } | GameEvent::EnemyAttacked { .. } => Some(Sfx::Hit),
            GameEvent::PlayerDied => Some(Sfx::Death),
            GameEvent::ExitReached => Some(Sfx::Exit),
            GameEvent::EnemyMoved { .. } | GameEvent::LevelGenerated { .. } => None,
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Synthesis: all produce Vec<f32> mono samples
// ════════════════════════════════════════════════════════════

/// A single tone segment. `noise` in [0, 1] is the share of white noise.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
struct Tone {
    freq: f32,
    end_freq: f32,
    secs: f32,
    noise: f32,
}

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
impl Tone {
    const fn note(freq: f32, secs: f32) -> Self {
        Tone { freq, end_freq: freq, secs, noise: 0.0 }
    }

    const fn sweep(freq: f32, end_freq: f32, secs: f32, noise: f32) -> Self {
        Tone { freq, end_freq, secs, noise }
    }
}

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn tones_for(sfx: Sfx) -> Vec<Tone> {
    match sfx {
        Sfx::Bump => vec![Tone::note(110.0, 0.04)],
        // C6, E6, G6
        Sfx::Treasure => vec![Tone::note(1047.0, 0.045), Tone::note(1319.0, 0.045), Tone::note(1568.0, 0.06)],
        Sfx::Trap => vec![Tone::sweep(500.0, 150.0, 0.14, 0.6)],
        Sfx::Hit => vec![Tone::sweep(220.0, 90.0, 0.10, 0.35)],
        // A4, F#4, Eb4, C4
        Sfx::Death => vec![
            Tone::note(440.0, 0.12),
            Tone::note(370.0, 0.12),
            Tone::note(311.0, 0.12),
            Tone::note(261.0, 0.30),
        ],
        // C5, E5, G5, C6
        Sfx::Exit => vec![
            Tone::note(523.0, 0.1),
            Tone::note(659.0, 0.1),
            Tone::note(784.0, 0.1),
            Tone::note(1047.0, 0.25),
        ],
    }
}

/// Render tone segments back to back, each with its own fade-out.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn synth(tones: &[Tone], volume: f32) -> Vec<f32> {
    let mut samples = Vec::new();
    let mut lcg: u32 = 12345;
    for tone in tones {
        let n = (SAMPLE_RATE as f32 * tone.secs) as usize;
        let mut phase = 0.0_f32;
        for i in 0..n {
            let t = i as f32 / n as f32;
            let freq = tone.freq + (tone.end_freq - tone.freq) * t;
            phase += freq / SAMPLE_RATE as f32;
            // Sine plus a 3rd harmonic for a retro edge
            let wave = (phase * 2.0 * PI).sin() * 0.7 + (phase * 3.0 * 2.0 * PI).sin() * 0.3;
            lcg = lcg.wrapping_mul(1103515245).wrapping_add(12345);
            let noise = (lcg as f32 / u32::MAX as f32) * 2.0 - 1.0;
            let env = (1.0 - t).powf(0.6);
            samples.push((wave * (1.0 - tone.noise) + noise * tone.noise) * env * volume);
        }
    }
    samples
}

/// Wrap f32 samples into a 16-bit mono PCM WAV buffer.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn make_wav(samples: &[f32]) -> Vec<u8> {
    let num_channels: u16 = 1;
    let bits_per_sample: u16 = 16;
    let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
    let block_align = num_channels * bits_per_sample / 8;
    let data_size = samples.len() as u32 * 2;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&num_channels.to_le_bytes());
    buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());

    for &s in samples {
        let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
        buf.extend_from_slice(&val.to_le_bytes());
    }

    buf
}

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use log::warn;
    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::{make_wav, synth, tones_for, Sfx};

    /// Pre-generated WAV buffers, indexed by `Sfx as usize`.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        buffers: Vec<Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("no audio output, running silent: {e}");
                    return None;
                }
            };

            let buffers = Sfx::ALL
                .iter()
                .map(|&sfx| Arc::new(make_wav(&synth(&tones_for(sfx), 0.3))))
                .collect();

            Some(SoundEngine { _stream: stream, handle, buffers })
        }

        pub fn play(&self, sfx: Sfx) {
            let buf = &self.buffers[sfx as usize];
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _sfx: Sfx) {}
}

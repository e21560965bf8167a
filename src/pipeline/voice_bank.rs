// Procedural drum voices. A trigger builds a complete ScheduledGraph with
// fresh noise; nothing persists between triggers.

use rand::Rng;

use crate::audio::filter::Biquad;
use crate::audio::{Branch, Curve, Envelope, ScheduledGraph, Source};
use crate::error::{Result, SequencerError};
use crate::shared::TrackId;

// exponential envelopes decay toward this instead of zero
const FLOOR: f32 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Voice {
    Kick,
    Snare,
    HiHat,
    Clap,
    Tom,
    Cymbal,
    Shaker,
}

impl Voice {
    pub fn for_track(track: TrackId) -> Voice {
        match track {
            TrackId::Kick => Voice::Kick,
            TrackId::Snare => Voice::Snare,
            TrackId::HiHat => Voice::HiHat,
            TrackId::Clap => Voice::Clap,
            TrackId::Tom => Voice::Tom,
            TrackId::Cymbal => Voice::Cymbal,
            TrackId::Shaker => Voice::Shaker,
        }
    }

    /// Build the sound for a trigger at bus frame `at`.
    pub fn trigger(self, track: TrackId, at: u64, sample_rate: u32) -> ScheduledGraph {
        let sr = sample_rate;
        let branches = match self {
            Voice::Kick => {
                let gain = Envelope::exp_ramp(0.3, FLOOR, 0.5);
                vec![
                    Branch::new(
                        Source::Sine { freq: Envelope::exp_ramp(150.0, 50.0, 0.1) },
                        vec![],
                        gain.clone(),
                        0.5,
                    ),
                    Branch::new(
                        Source::Sine { freq: Envelope::constant(50.0) },
                        vec![],
                        gain,
                        0.5,
                    ),
                ]
            }
            Voice::Snare => vec![
                Branch::new(
                    Source::Noise { buffer: white_noise(0.2, sr) },
                    vec![Biquad::high_pass(1000.0, sr)],
                    Envelope::exp_ramp(1.0, FLOOR, 0.2),
                    0.2,
                ),
                Branch::new(
                    Source::Triangle { freq: Envelope::constant(200.0) },
                    vec![],
                    Envelope::exp_ramp(0.7, FLOOR, 0.1),
                    0.1,
                ),
            ],
            Voice::HiHat => vec![Branch::new(
                Source::Noise { buffer: white_noise(0.1, sr) },
                vec![Biquad::band_pass(10_000.0, sr), Biquad::high_pass(7000.0, sr)],
                Envelope::exp_ramp(0.5, FLOOR, 0.1),
                0.1,
            )],
            Voice::Clap => vec![Branch::new(
                Source::Noise { buffer: white_noise(0.2, sr) },
                vec![Biquad::high_pass(2000.0, sr)],
                clap_envelope(),
                0.2,
            )],
            Voice::Tom => vec![Branch::new(
                Source::Sine { freq: Envelope::exp_ramp(200.0, 80.0, 0.3) },
                vec![],
                Envelope::exp_ramp(0.3, FLOOR, 0.4),
                0.4,
            )],
            Voice::Cymbal => vec![Branch::new(
                Source::Noise { buffer: white_noise(0.5, sr) },
                vec![Biquad::high_pass(5000.0, sr)],
                Envelope::exp_ramp(0.3, FLOOR, 0.5),
                0.5,
            )],
            Voice::Shaker => vec![Branch::new(
                Source::Noise { buffer: white_noise(0.3, sr) },
                vec![Biquad::band_pass(2000.0, sr)],
                Envelope::exp_ramp(0.8, FLOOR, 0.3),
                0.3,
            )],
        };

        ScheduledGraph {
            track,
            at,
            sample_rate,
            branches,
        }
    }
}

// three hand claps 20ms apart, the last one rings out
fn clap_envelope() -> Envelope {
    const PEAK: f32 = 0.8;
    Envelope::constant(PEAK)
        .then(0.0, 0.02, PEAK, 0.1, Curve::Exponential)
        .then(0.02, 0.04, PEAK, 0.1, Curve::Exponential)
        .then(0.04, 0.2, PEAK, FLOOR, Curve::Exponential)
}

// uniform in [-1, 1], one buffer per trigger
fn white_noise(duration: f32, sample_rate: u32) -> Vec<f32> {
    let len = (duration * sample_rate as f32).round() as usize;
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen_range(-1.0f32..=1.0)).collect()
}

/// Maps the configured tracks onto their voices.
pub struct VoiceBank {
    voices: Vec<(TrackId, Voice)>,
    sample_rate: u32,
}

impl VoiceBank {
    pub fn new(tracks: &[TrackId], sample_rate: u32) -> Self {
        Self {
            voices: tracks.iter().map(|&t| (t, Voice::for_track(t))).collect(),
            sample_rate,
        }
    }

    pub fn trigger(&self, track: TrackId, at: u64) -> Result<ScheduledGraph> {
        let voice = self
            .voices
            .iter()
            .find(|(t, _)| *t == track)
            .map(|&(_, v)| v)
            .ok_or_else(|| SequencerError::InvalidArgument(format!("no voice for track `{track}`")))?;
        Ok(voice.trigger(track, at, self.sample_rate))
    }
}

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Receiver;

use crate::audio_api::{AudioCommand, AudioLink};
use crate::error::SequencerError;

mod bus;
mod engine;
pub mod filter;
pub mod graph;
mod voice;

pub use bus::OutputBus;
pub use engine::Engine;
pub use graph::{Branch, Curve, Envelope, ScheduledGraph, Source};

const COMMAND_QUEUE: usize = 1024;
const TAP_QUEUE: usize = 256;

// Keeps the device stream alive; dropping it silences the engine.
pub struct AudioHandle {
    _output_stream: cpal::Stream,
}

// Wires a fresh engine to its control-side link. The engine is moved into
// the device callback by `start_audio`; tests render it directly.
pub fn link(sample_rate: u32, master_volume: f32) -> (AudioLink, Engine, Receiver<AudioCommand>) {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(COMMAND_QUEUE);
    let (tap_tx, tap_rx) = crossbeam_channel::bounded::<Vec<f32>>(TAP_QUEUE);
    let bus = Arc::new(OutputBus::new(master_volume));
    let engine = Engine::new(bus.clone(), tap_tx);
    let link = AudioLink {
        tx,
        blocks: tap_rx,
        bus,
        sample_rate,
    };
    (link, engine, rx)
}

pub fn start_audio(master_volume: f32) -> Result<(AudioHandle, AudioLink), SequencerError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| SequencerError::AudioUnavailable("no default output device".into()))?;
    let config = device
        .default_output_config()
        .map_err(|e| SequencerError::AudioUnavailable(format!("no default output config: {e}")))?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let (audio_link, engine, rx) = link(sample_rate, master_volume);
            let output_stream =
                build_output_stream_f32(&device, &config.into(), rx, engine, channels)?;
            output_stream.play().map_err(|e| {
                SequencerError::AudioUnavailable(format!("failed to play output stream: {e}"))
            })?;
            log::info!("audio running: {sample_rate} Hz, {channels} channel(s)");

            Ok((
                AudioHandle {
                    _output_stream: output_stream,
                },
                audio_link,
            ))
        }
        other => Err(SequencerError::AudioUnavailable(format!(
            "unsupported sample format {other:?} (only f32 supported for now)"
        ))),
    }
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    mut engine: Engine,
    channels: usize,
) -> Result<cpal::Stream, SequencerError> {
    let err_fn = |err| log::error!("audio output stream error: {err}");

    device
        .build_output_stream(
            config,
            move |data: &mut [f32], _info| {
                while let Ok(cmd) = rx.try_recv() {
                    engine.handle_cmd(cmd);
                }
                engine.render_block(data, channels);
            },
            err_fn,
            None,
        )
        .map_err(|e| SequencerError::AudioUnavailable(format!("failed to build output stream: {e}")))
}

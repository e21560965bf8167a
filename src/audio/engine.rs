use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::audio_api::AudioCommand;

use super::bus::OutputBus;
use super::graph::ScheduledGraph;

const MAX_VOICES: usize = 32; // hard cap so we wont malloc in audio callback
const MIX_CAPACITY: usize = 8192;

struct Tap {
    block_size: usize,
    pending: Vec<f32>,
}

pub struct Engine {
    bus: Arc<OutputBus>,
    voices: Vec<ScheduledGraph>,
    mix: Vec<f32>,
    tap: Option<Tap>,
    tap_tx: Sender<Vec<f32>>,
}

impl Engine {
    pub fn new(bus: Arc<OutputBus>, tap_tx: Sender<Vec<f32>>) -> Self {
        Self {
            bus,
            voices: Vec::with_capacity(MAX_VOICES),
            mix: Vec::with_capacity(MIX_CAPACITY),
            tap: None,
            tap_tx,
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Schedule(graph) => self.schedule(graph),
            AudioCommand::AttachTap { block_size } => {
                self.tap = Some(Tap {
                    block_size,
                    pending: Vec::with_capacity(block_size),
                });
            }
            AudioCommand::DetachTap => self.tap = None,
        }
    }

    fn schedule(&mut self, graph: ScheduledGraph) {
        if self.voices.len() < MAX_VOICES {
            self.voices.push(graph);
        } else {
            // steal the oldest, it is the one closest to silence
            self.voices.remove(0);
            self.voices.push(graph);
        }
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    // Render one device buffer: interleaved, `channels` wide. The mono bus
    // is written to every channel.
    pub fn render_block(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let n_frames = out.len() / channels;
        let now = self.bus.now();

        self.mix.clear();
        self.mix.resize(n_frames, 0.0);

        for voice in self.voices.iter_mut() {
            // graphs scheduled for a later frame start part-way into the block
            let offset = voice.at.saturating_sub(now) as usize;
            if offset >= n_frames {
                continue;
            }
            voice.render_into(&mut self.mix[offset..]);
        }
        self.voices.retain(|v| !v.is_finished());

        let gain = self.bus.gain();
        for s in self.mix.iter_mut() {
            *s *= gain;
        }

        if let Some(tap) = self.tap.as_mut() {
            tap.capture(&self.mix, &self.tap_tx);
        }

        for (frame, &s) in out.chunks_exact_mut(channels).zip(self.mix.iter()) {
            frame.fill(s);
        }
        self.bus.advance(n_frames as u64);
    }
}

impl Tap {
    fn capture(&mut self, mut samples: &[f32], tx: &Sender<Vec<f32>>) {
        while !samples.is_empty() {
            let room = self.block_size - self.pending.len();
            let take = room.min(samples.len());
            self.pending.extend_from_slice(&samples[..take]);
            samples = &samples[take..];

            if self.pending.len() == self.block_size {
                let block = std::mem::replace(
                    &mut self.pending,
                    Vec::with_capacity(self.block_size),
                );
                // the control loop is behind; losing a block beats blocking here
                let _ = tx.try_send(block);
            }
        }
    }
}

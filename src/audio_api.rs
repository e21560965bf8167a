use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

pub use crate::audio::{OutputBus, ScheduledGraph};

#[derive(Clone, Debug)]
pub enum AudioCommand {
    // Everything the engine needs is already inside the graph (noise buffers,
    // filter coefficients), so the callback never allocates for a trigger.
    Schedule(ScheduledGraph),

    // Start copying the bus into blocks of `block_size` samples
    AttachTap { block_size: usize },

    // Stop copying; a partially filled block is dropped
    DetachTap,
}

/// Control-side ends of the audio engine: commands in, captured blocks out,
/// plus the shared bus for gain and the audio clock.
#[derive(Clone)]
pub struct AudioLink {
    pub tx: Sender<AudioCommand>,
    pub blocks: Receiver<Vec<f32>>,
    pub bus: Arc<OutputBus>,
    pub sample_rate: u32,
}

impl AudioLink {
    // fire-and-forget; a full queue drops the command rather than blocking
    pub fn send(&self, cmd: AudioCommand) {
        if self.tx.try_send(cmd).is_err() {
            log::warn!("audio command queue full, command dropped");
        }
    }

    pub fn now(&self) -> u64 {
        self.bus.now()
    }
}

use crate::error::{Result, SequencerError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
}

/// Blocks copied off the bus tap, plus a running sample count. The count is
/// authoritative when merging: anything past it is ignored.
#[derive(Clone, Debug, Default)]
pub struct CapturedRecording {
    blocks: Vec<Vec<f32>>,
    total_len: usize,
}

impl CapturedRecording {
    pub fn push(&mut self, block: Vec<f32>) {
        self.total_len += block.len();
        self.blocks.push(block);
    }

    pub fn len(&self) -> usize {
        self.total_len
    }

    pub fn is_empty(&self) -> bool {
        self.total_len == 0
    }

    pub fn blocks(&self) -> &[Vec<f32>] {
        &self.blocks
    }

    pub fn merged(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.total_len);
        for block in &self.blocks {
            let take = (self.total_len - out.len()).min(block.len());
            out.extend_from_slice(&block[..take]);
            if out.len() == self.total_len {
                break;
            }
        }
        out
    }
}

pub struct Recorder {
    state: RecorderState,
    capture: CapturedRecording,
    block_size: usize,
}

impl Recorder {
    pub fn new(block_size: usize) -> Self {
        Self {
            state: RecorderState::Idle,
            capture: CapturedRecording::default(),
            block_size,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn capture(&self) -> &CapturedRecording {
        &self.capture
    }

    // Returns false when already recording. The previous capture is dropped.
    pub fn start(&mut self) -> bool {
        if self.is_recording() {
            return false;
        }
        self.capture = CapturedRecording::default();
        self.state = RecorderState::Recording;
        true
    }

    // Blocks arriving while idle are late tap deliveries and are discarded.
    pub fn on_block(&mut self, block: Vec<f32>) {
        if self.is_recording() {
            self.capture.push(block);
        }
    }

    /// Ok(true) when there is something to export.
    pub fn stop(&mut self) -> Result<bool> {
        if !self.is_recording() {
            return Err(SequencerError::NoActiveRecording);
        }
        self.state = RecorderState::Idle;
        Ok(!self.capture.is_empty())
    }
}

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// The single mixing point every voice goes through. Shared between the
/// control loop (writes the gain) and the audio callback (reads it, advances
/// the frame clock). One atomic scalar each, so no locking.
#[derive(Debug)]
pub struct OutputBus {
    gain_bits: AtomicU32,
    frames: AtomicU64,
}

impl OutputBus {
    pub fn new(gain: f32) -> Self {
        Self {
            gain_bits: AtomicU32::new(gain.clamp(0.0, 1.0).to_bits()),
            frames: AtomicU64::new(0),
        }
    }

    pub fn gain(&self) -> f32 {
        f32::from_bits(self.gain_bits.load(Ordering::Relaxed))
    }

    pub fn set_gain(&self, gain: f32) {
        self.gain_bits
            .store(gain.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    // audio clock: frames rendered so far
    pub fn now(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    pub(super) fn advance(&self, n: u64) {
        self.frames.fetch_add(n, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gain_is_clamped_to_unit_range() {
        let bus = OutputBus::new(0.7);
        assert_eq!(bus.gain(), 0.7);
        bus.set_gain(1.5);
        assert_eq!(bus.gain(), 1.0);
        bus.set_gain(-0.2);
        assert_eq!(bus.gain(), 0.0);
    }

    #[test]
    fn clock_advances_monotonically() {
        let bus = OutputBus::new(1.0);
        bus.advance(512);
        bus.advance(512);
        assert_eq!(bus.now(), 1024);
    }
}

// Transport state machine. While running, a free-running crossbeam ticker
// marks when the next 16th-note step is due; the control loop drains it.
// Periods are scheduled independently, so drift against musical time
// accumulates and is not corrected.

use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Running,
}

// four 16th-note steps per beat
pub fn step_period_ms(bpm: u32) -> f64 {
    60_000.0 / bpm as f64 / 4.0
}

pub fn step_period(bpm: u32) -> Duration {
    Duration::from_secs_f64(step_period_ms(bpm) / 1000.0)
}

pub struct Clock {
    state: TransportState,
    current_step: Option<usize>, // None = "one before the first step"
    bpm: u32,
    min_bpm: u32,
    max_bpm: u32,
    steps: usize,
    ticker: Option<Receiver<Instant>>,
}

impl Clock {
    pub fn new(steps: usize, bpm: u32, min_bpm: u32, max_bpm: u32) -> Self {
        Self {
            state: TransportState::Stopped,
            current_step: None,
            bpm: bpm.clamp(min_bpm, max_bpm),
            min_bpm,
            max_bpm,
            steps,
            ticker: None,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TransportState::Running
    }

    pub fn current_step(&self) -> Option<usize> {
        self.current_step
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    // Returns false when already running. The caller fires the first tick
    // itself so step 0 sounds with no latency.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.current_step = None;
        self.state = TransportState::Running;
        self.arm();
        true
    }

    // Stopping clears the step marker; the next start always begins at step 0.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.ticker = None;
        self.current_step = None;
        self.state = TransportState::Stopped;
        true
    }

    // Clamps into range. A running clock restarts its ticker, so the next step
    // lands one full new period from now.
    pub fn set_tempo(&mut self, bpm: u32) -> u32 {
        self.bpm = bpm.clamp(self.min_bpm, self.max_bpm);
        if self.is_running() {
            self.arm();
        }
        self.bpm
    }

    fn arm(&mut self) {
        self.ticker = Some(crossbeam_channel::tick(step_period(self.bpm)));
    }

    // how many ticks the timer has delivered since the last call
    pub fn due_ticks(&self) -> usize {
        match &self.ticker {
            Some(rx) => rx.try_iter().count(),
            None => 0,
        }
    }

    pub fn advance(&mut self) -> usize {
        let next = match self.current_step {
            None => 0,
            Some(i) => (i + 1) % self.steps,
        };
        self.current_step = Some(next);
        next
    }
}

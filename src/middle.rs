// The core: owns the pattern, the clock, the recorder and the link to the
// audio engine. Everything here runs on the control loop; the only thing
// shared with the audio callback is what AudioLink carries.

use std::path::{Path, PathBuf};

use crossbeam_channel::{Receiver, Sender};

use crate::audio_api::{AudioCommand, AudioLink};
use crate::config::Config;
use crate::error::Result;
use crate::pipeline::clock::Clock;
use crate::pipeline::export::Exporter;
use crate::pipeline::pattern::PatternStore;
use crate::pipeline::recorder::Recorder;
use crate::pipeline::voice_bank::VoiceBank;
use crate::shared::{DisplayState, InputEvent, Notification, TrackId};

const TEMPO_STEP: i32 = 4;

pub struct SequencerContext {
    pattern: PatternStore,
    clock: Clock,
    bank: VoiceBank,
    recorder: Recorder,
    exporter: Exporter,
    audio: AudioLink,
    notify_tx: Sender<Notification>,
    notify_rx: Receiver<Notification>,
    status: String,
}

impl SequencerContext {
    pub fn new(config: &Config, project_dir: &Path, audio: AudioLink) -> Self {
        let (notify_tx, notify_rx) = crossbeam_channel::unbounded();
        audio.bus.set_gain(config.master_volume);
        Self {
            pattern: PatternStore::new(&config.tracks, config.steps),
            clock: Clock::new(config.steps, config.bpm, config.min_bpm, config.max_bpm),
            bank: VoiceBank::new(&config.tracks, audio.sample_rate),
            recorder: Recorder::new(config.record_block_size),
            exporter: Exporter::new(
                config.export.format,
                config.export_dir(project_dir),
                audio.sample_rate,
                config.export.kbps,
            ),
            audio,
            notify_tx,
            notify_rx,
            status: String::new(),
        }
    }

    pub fn notifications(&self) -> Receiver<Notification> {
        self.notify_rx.clone()
    }

    fn notify(&self, n: Notification) {
        let _ = self.notify_tx.send(n);
    }

    // -- transport --

    pub fn start(&mut self) {
        if !self.clock.start() {
            return;
        }
        log::info!("transport started at {} bpm", self.clock.bpm());
        // first step sounds now, not one period from now
        self.tick();
    }

    pub fn stop(&mut self) {
        if self.clock.stop() {
            log::info!("transport stopped");
        }
    }

    pub fn set_tempo(&mut self, bpm: u32) -> u32 {
        let bpm = self.clock.set_tempo(bpm);
        log::debug!("tempo {bpm}");
        bpm
    }

    fn tick(&mut self) {
        let step = self.clock.advance();
        log::debug!("step {step}");
        self.notify(Notification::StepAdvanced(step));
        let hits: Vec<TrackId> = self.pattern.active_at(step).collect();
        for track in hits {
            // tracks in the pattern always have a voice
            if let Err(e) = self.trigger(track) {
                log::warn!("{e}");
            }
        }
    }

    // Called every pass of the control loop.
    pub fn poll(&mut self) {
        for _ in 0..self.clock.due_ticks() {
            self.tick();
        }
        for block in self.audio.blocks.try_iter() {
            // late deliveries after stop are dropped by the recorder
            self.recorder.on_block(block);
        }
    }

    // -- pattern --

    pub fn toggle_step(&mut self, track: TrackId, index: usize) -> Result<bool> {
        self.pattern.toggle(track, index)
    }

    pub fn clear(&mut self) {
        self.pattern.clear();
    }

    // -- voices and bus --

    fn trigger(&mut self, track: TrackId) -> Result<()> {
        let graph = self.bank.trigger(track, self.audio.now())?;
        self.audio.send(AudioCommand::Schedule(graph));
        self.notify(Notification::TrackTriggered(track));
        Ok(())
    }

    pub fn trigger_pad(&mut self, track: TrackId) -> Result<()> {
        self.trigger(track)
    }

    pub fn set_volume(&mut self, level: f32) {
        self.audio.bus.set_gain(level);
    }

    pub fn volume(&self) -> f32 {
        self.audio.bus.gain()
    }

    // -- recording --

    pub fn start_recording(&mut self) {
        if !self.recorder.start() {
            return;
        }
        // stale blocks from an earlier tap must not leak into this capture
        while self.audio.blocks.try_recv().is_ok() {}
        self.audio.send(AudioCommand::AttachTap {
            block_size: self.recorder.block_size(),
        });
        log::info!("recording started");
        self.notify(Notification::RecordingStateChanged(true));
    }

    pub fn stop_recording(&mut self) {
        if !self.recorder.is_recording() {
            return;
        }
        // blocks already delivered belong to this take
        for block in self.audio.blocks.try_iter() {
            self.recorder.on_block(block);
        }
        self.audio.send(AudioCommand::DetachTap);
        let Ok(has_audio) = self.recorder.stop() else {
            return;
        };
        log::info!("recording stopped, {} samples", self.recorder.capture().len());
        self.notify(Notification::RecordingStateChanged(false));
        if has_audio {
            self.export();
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    pub fn captured_samples(&self) -> usize {
        self.recorder.capture().len()
    }

    /// Encode and write the last capture. Errors are logged and shown; the
    /// capture stays put so issuing the command again retries.
    pub fn export(&mut self) -> Option<PathBuf> {
        match self.exporter.export(self.recorder.capture()) {
            Ok(Some(path)) => {
                self.status = format!("saved {}", path.display());
                Some(path)
            }
            Ok(None) => None,
            Err(e) => {
                log::error!("export failed: {e:#}");
                self.status = format!("export failed: {e}");
                None
            }
        }
    }

    // -- presentation --

    pub fn handle_input(&mut self, event: InputEvent) -> Result<()> {
        match event {
            InputEvent::PlayPress => {
                if self.clock.is_running() {
                    self.stop();
                } else {
                    self.start();
                }
            }
            InputEvent::Clear => self.clear(),
            InputEvent::ToggleStep(track, index) => {
                self.toggle_step(track, index)?;
            }
            InputEvent::TriggerPad(track) => self.trigger_pad(track)?,
            InputEvent::AdjustTempo(delta) => {
                let bpm = (self.clock.bpm() as i64 + (delta * TEMPO_STEP) as i64).max(0) as u32;
                self.set_tempo(bpm);
            }
            InputEvent::AdjustVolume(delta) => self.set_volume(self.volume() + delta),
            InputEvent::RecordPress => {
                if self.recorder.is_recording() {
                    self.stop_recording();
                } else {
                    self.start_recording();
                }
            }
            InputEvent::Export => {
                self.export();
            }
            InputEvent::Quit => {}
        }
        Ok(())
    }

    pub fn display_state(&self) -> DisplayState {
        DisplayState {
            rows: self
                .pattern
                .rows()
                .map(|(t, row)| (t, row.to_vec()))
                .collect(),
            current_step: self.clock.current_step(),
            playing: self.clock.is_running(),
            recording: self.recorder.is_recording(),
            bpm: self.clock.bpm(),
            master_volume: self.volume(),
            captured_secs: self.captured_samples() as f32 / self.audio.sample_rate as f32,
            status: self.status.clone(),
        }
    }
}

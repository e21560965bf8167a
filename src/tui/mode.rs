use std::time::{Duration, Instant};

use crate::shared::{DisplayState, Notification, TrackId};

const FLASH: Duration = Duration::from_millis(120);

// state local to the tui: the grid cursor and short-lived pad flashes.
// tracks, steps, playing and recording are synced from DisplayState per loop
#[derive(Clone, Debug)]
pub struct TuiState {
    pub cursor_track: usize,
    pub cursor_step: usize,
    pub tracks: Vec<TrackId>,
    pub steps: usize,
    pub playing: bool,
    pub recording: bool,
    flashes: Vec<(TrackId, Instant)>,
}

impl Default for TuiState {
    fn default() -> Self {
        Self {
            cursor_track: 0,
            cursor_step: 0,
            tracks: Vec::new(),
            steps: 0,
            playing: false,
            recording: false,
            flashes: Vec::new(),
        }
    }
}

impl TuiState {
    pub fn sync(&mut self, ds: &DisplayState) {
        self.tracks = ds.rows.iter().map(|(t, _)| *t).collect();
        self.steps = ds.rows.first().map(|(_, r)| r.len()).unwrap_or(0);
        self.playing = ds.playing;
        self.recording = ds.recording;
        self.cursor_track = self.cursor_track.min(self.tracks.len().saturating_sub(1));
        self.cursor_step = self.cursor_step.min(self.steps.saturating_sub(1));
    }

    pub fn observe(&mut self, note: Notification) {
        if let Notification::TrackTriggered(track) = note {
            self.flashes.retain(|(t, _)| *t != track);
            self.flashes.push((track, Instant::now()));
        }
    }

    pub fn is_flashing(&self, track: TrackId) -> bool {
        self.flashes
            .iter()
            .any(|(t, at)| *t == track && at.elapsed() < FLASH)
    }

    pub fn move_cursor(&mut self, d_track: isize, d_step: isize) {
        if self.tracks.is_empty() || self.steps == 0 {
            return;
        }
        let wrap = |v: usize, d: isize, n: usize| (v as isize + d).rem_euclid(n as isize) as usize;
        self.cursor_track = wrap(self.cursor_track, d_track, self.tracks.len());
        self.cursor_step = wrap(self.cursor_step, d_step, self.steps);
    }

    pub fn cursor_track_id(&self) -> Option<TrackId> {
        self.tracks.get(self.cursor_track).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ds() -> DisplayState {
        DisplayState {
            rows: vec![(TrackId::Kick, vec![false; 16]), (TrackId::Snare, vec![false; 16])],
            current_step: None,
            playing: false,
            recording: false,
            bpm: 120,
            master_volume: 0.7,
            captured_secs: 0.0,
            status: String::new(),
        }
    }

    #[test]
    fn cursor_wraps_both_ways() {
        let mut ts = TuiState::default();
        ts.sync(&ds());
        ts.move_cursor(-1, -1);
        assert_eq!((ts.cursor_track, ts.cursor_step), (1, 15));
        ts.move_cursor(1, 1);
        assert_eq!((ts.cursor_track, ts.cursor_step), (0, 0));
        assert_eq!(ts.cursor_track_id(), Some(TrackId::Kick));
    }

    #[test]
    fn triggered_tracks_flash() {
        let mut ts = TuiState::default();
        ts.observe(Notification::TrackTriggered(TrackId::Snare));
        ts.observe(Notification::StepAdvanced(3));
        assert!(ts.is_flashing(TrackId::Snare));
        assert!(!ts.is_flashing(TrackId::Kick));
    }
}

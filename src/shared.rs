// Types shared between the core (middle.rs) and the terminal front end.
//
// Keys (resolved into InputEvents by tui/input.rs):
//   Space         //  PlayPress (start / stop)
//   arrows        //  move the grid cursor (handled inside the TUI)
//   Enter / x     //  ToggleStep(track, step) at the cursor
//   1 .. 7        //  TriggerPad(track), one-shot outside the sequencer
//   - / =         //  AdjustTempo(-4 / +4)
//   [ / ]         //  AdjustVolume(-0.05 / +0.05)
//   c             //  Clear
//   r             //  RecordPress (start / stop capture)
//   e             //  Export (re-export the last capture)
//   Esc           //  Quit
//
// The core owns all sequencer state; the TUI renders a DisplayState snapshot
// every frame and reacts to Notifications for short-lived visuals.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SequencerError;

pub const DEFAULT_STEPS: usize = 16;
pub const DEFAULT_BPM: u32 = 120;
pub const MIN_BPM: u32 = 60;
pub const MAX_BPM: u32 = 180;
pub const DEFAULT_MASTER_VOLUME: f32 = 0.7;
pub const RECORD_BLOCK_SIZE: usize = 4096;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackId {
    Kick,
    Snare,
    HiHat,
    Clap,
    Tom,
    Cymbal,
    Shaker,
}

impl TrackId {
    pub const ALL: [TrackId; 7] = [
        TrackId::Kick,
        TrackId::Snare,
        TrackId::HiHat,
        TrackId::Clap,
        TrackId::Tom,
        TrackId::Cymbal,
        TrackId::Shaker,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TrackId::Kick => "kick",
            TrackId::Snare => "snare",
            TrackId::HiHat => "hihat",
            TrackId::Clap => "clap",
            TrackId::Tom => "tom",
            TrackId::Cymbal => "cymbal",
            TrackId::Shaker => "shaker",
        }
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TrackId {
    type Err = SequencerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrackId::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| SequencerError::InvalidArgument(format!("unknown track `{s}`")))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    PlayPress,
    Clear,
    ToggleStep(TrackId, usize),
    TriggerPad(TrackId),
    AdjustTempo(i32),
    AdjustVolume(f32),
    RecordPress,
    Export,
    Quit,
}

// Emitted by the core, drained by the presentation layer
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Notification {
    StepAdvanced(usize),
    TrackTriggered(TrackId),
    RecordingStateChanged(bool),
}

#[derive(Clone, Debug)]
pub struct DisplayState {
    pub rows: Vec<(TrackId, Vec<bool>)>,
    pub current_step: Option<usize>, // None while stopped
    pub playing: bool,
    pub recording: bool,
    pub bpm: u32,
    pub master_volume: f32,
    pub captured_secs: f32,
    pub status: String, // last export path or error, shown in the footer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_names_parse_back() {
        for track in TrackId::ALL {
            assert_eq!(track.name().parse::<TrackId>().unwrap(), track);
        }
        assert_eq!("HiHat".parse::<TrackId>().unwrap(), TrackId::HiHat);
    }

    #[test]
    fn unknown_track_is_invalid_argument() {
        let err = "cowbell".parse::<TrackId>().unwrap_err();
        assert!(matches!(err, SequencerError::InvalidArgument(_)));
    }

    #[test]
    fn track_ids_serialize_lowercase() {
        let json = serde_json::to_string(&TrackId::HiHat).unwrap();
        assert_eq!(json, "\"hihat\"");
    }
}

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use super::mode::TuiState;
use crate::shared::InputEvent;

const VOLUME_STEP: f32 = 0.05;

// poll for input from the terminal; cursor movement stays inside the tui,
// everything else resolves into semantic events for the core
pub fn poll_input(timeout: Duration, ts: &mut TuiState) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code, ts));
    }
    Ok(vec![])
}

fn handle_key(code: KeyCode, ts: &mut TuiState) -> Vec<InputEvent> {
    match code {
        KeyCode::Esc => vec![InputEvent::Quit],
        KeyCode::Char(' ') => vec![InputEvent::PlayPress],

        KeyCode::Up => { ts.move_cursor(-1, 0); vec![] }
        KeyCode::Down => { ts.move_cursor(1, 0); vec![] }
        KeyCode::Left => { ts.move_cursor(0, -1); vec![] }
        KeyCode::Right => { ts.move_cursor(0, 1); vec![] }

        KeyCode::Enter | KeyCode::Char('x') => match ts.cursor_track_id() {
            Some(track) => vec![InputEvent::ToggleStep(track, ts.cursor_step)],
            None => vec![],
        },

        // pads 1-7 follow the track order on screen
        KeyCode::Char(c @ '1'..='9') => {
            let idx = c as usize - '1' as usize;
            match ts.tracks.get(idx) {
                Some(&track) => vec![InputEvent::TriggerPad(track)],
                None => vec![],
            }
        }

        KeyCode::Char('-') => vec![InputEvent::AdjustTempo(-1)],
        KeyCode::Char('=') => vec![InputEvent::AdjustTempo(1)],
        KeyCode::Char('[') => vec![InputEvent::AdjustVolume(-VOLUME_STEP)],
        KeyCode::Char(']') => vec![InputEvent::AdjustVolume(VOLUME_STEP)],

        KeyCode::Char('c') => vec![InputEvent::Clear],
        KeyCode::Char('r') => vec![InputEvent::RecordPress],
        KeyCode::Char('e') => vec![InputEvent::Export],

        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::TrackId;

    fn ts() -> TuiState {
        let mut ts = TuiState::default();
        ts.tracks = TrackId::ALL.to_vec();
        ts.steps = 16;
        ts
    }

    #[test]
    fn toggle_uses_cursor_position() {
        let mut ts = ts();
        handle_key(KeyCode::Down, &mut ts);
        handle_key(KeyCode::Right, &mut ts);
        handle_key(KeyCode::Right, &mut ts);
        assert_eq!(handle_key(KeyCode::Enter, &mut ts), vec![InputEvent::ToggleStep(TrackId::Snare, 2)]);
    }

    #[test]
    fn number_keys_trigger_pads() {
        let mut ts = ts();
        assert_eq!(handle_key(KeyCode::Char('1'), &mut ts), vec![InputEvent::TriggerPad(TrackId::Kick)]);
        assert_eq!(handle_key(KeyCode::Char('7'), &mut ts), vec![InputEvent::TriggerPad(TrackId::Shaker)]);
        assert!(handle_key(KeyCode::Char('9'), &mut ts).is_empty());
    }

    #[test]
    fn transport_and_recording_keys() {
        let mut ts = ts();
        assert_eq!(handle_key(KeyCode::Char(' '), &mut ts), vec![InputEvent::PlayPress]);
        assert_eq!(handle_key(KeyCode::Char('r'), &mut ts), vec![InputEvent::RecordPress]);
        assert_eq!(handle_key(KeyCode::Esc, &mut ts), vec![InputEvent::Quit]);
    }
}

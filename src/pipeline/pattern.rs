// The step grid. One row per configured track, every row exactly `steps`
// long; column order is playback order and wraps around.

use crate::error::{Result, SequencerError};
use crate::shared::TrackId;

#[derive(Clone, Debug)]
pub struct PatternStore {
    tracks: Vec<TrackId>,
    rows: Vec<Vec<bool>>,
    steps: usize,
}

impl PatternStore {
    pub fn new(tracks: &[TrackId], steps: usize) -> Self {
        Self {
            tracks: tracks.to_vec(),
            rows: vec![vec![false; steps]; tracks.len()],
            steps,
        }
    }

    pub fn tracks(&self) -> &[TrackId] {
        &self.tracks
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    fn row_index(&self, track: TrackId) -> Result<usize> {
        self.tracks
            .iter()
            .position(|&t| t == track)
            .ok_or_else(|| SequencerError::InvalidArgument(format!("track `{track}` is not configured")))
    }

    fn check_step(&self, index: usize) -> Result<()> {
        if index >= self.steps {
            return Err(SequencerError::InvalidArgument(format!(
                "step {index} out of range 0..{}",
                self.steps
            )));
        }
        Ok(())
    }

    pub fn row(&self, track: TrackId) -> Result<&[bool]> {
        let r = self.row_index(track)?;
        Ok(&self.rows[r])
    }

    pub fn is_active(&self, track: TrackId, index: usize) -> Result<bool> {
        self.check_step(index)?;
        let r = self.row_index(track)?;
        Ok(self.rows[r][index])
    }

    // returns the new value of the flag
    pub fn toggle(&mut self, track: TrackId, index: usize) -> Result<bool> {
        self.check_step(index)?;
        let r = self.row_index(track)?;
        let flag = &mut self.rows[r][index];
        *flag = !*flag;
        Ok(*flag)
    }

    pub fn clear(&mut self) {
        for row in self.rows.iter_mut() {
            row.fill(false);
        }
    }

    /// Tracks with a step set at `index`, in track order.
    pub fn active_at(&self, index: usize) -> impl Iterator<Item = TrackId> + '_ {
        self.tracks
            .iter()
            .zip(self.rows.iter())
            .filter(move |(_, row)| row.get(index).copied().unwrap_or(false))
            .map(|(&t, _)| t)
    }

    pub fn rows(&self) -> impl Iterator<Item = (TrackId, &[bool])> + '_ {
        self.tracks
            .iter()
            .zip(self.rows.iter())
            .map(|(&t, row)| (t, row.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PatternStore {
        PatternStore::new(&TrackId::ALL, 16)
    }

    #[test]
    fn every_row_has_step_count_entries() {
        let p = store();
        assert_eq!(p.rows().count(), 7);
        assert!(p.rows().all(|(_, row)| row.len() == 16 && row.iter().all(|&s| !s)));
    }

    #[test]
    fn toggle_twice_is_identity() {
        let mut p = store();
        assert!(p.toggle(TrackId::Snare, 4).unwrap());
        assert!(p.is_active(TrackId::Snare, 4).unwrap());
        assert!(!p.toggle(TrackId::Snare, 4).unwrap());
        assert!(!p.is_active(TrackId::Snare, 4).unwrap());
    }

    #[test]
    fn clear_resets_everything_and_is_idempotent() {
        let mut p = store();
        for (i, track) in TrackId::ALL.into_iter().enumerate() {
            p.toggle(track, i).unwrap();
            p.toggle(track, 15 - i).unwrap();
        }
        p.clear();
        assert!(p.rows().all(|(_, row)| row.iter().all(|&s| !s)));
        p.clear();
        assert!(p.rows().all(|(_, row)| row.iter().all(|&s| !s)));
    }

    #[test]
    fn out_of_range_step_is_rejected() {
        let mut p = store();
        assert!(matches!(p.toggle(TrackId::Kick, 16), Err(SequencerError::InvalidArgument(_))));
        assert!(matches!(p.is_active(TrackId::Kick, 99), Err(SequencerError::InvalidArgument(_))));
    }

    #[test]
    fn unconfigured_track_is_rejected() {
        let mut p = PatternStore::new(&[TrackId::Kick, TrackId::Snare], 8);
        assert!(matches!(p.toggle(TrackId::Cymbal, 0), Err(SequencerError::InvalidArgument(_))));
        assert!(p.row(TrackId::Cymbal).is_err());
    }

    #[test]
    fn active_at_lists_tracks_in_order() {
        let mut p = store();
        p.toggle(TrackId::HiHat, 2).unwrap();
        p.toggle(TrackId::Kick, 2).unwrap();
        p.toggle(TrackId::Clap, 3).unwrap();
        let hits: Vec<TrackId> = p.active_at(2).collect();
        assert_eq!(hits, vec![TrackId::Kick, TrackId::HiHat]);
    }
}

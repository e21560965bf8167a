use std::f32::consts::TAU;

use super::graph::{Branch, ScheduledGraph, Source};

impl Branch {
    fn frames(&self, sample_rate: f32) -> usize {
        (self.duration * sample_rate).round() as usize
    }

    pub fn is_finished(&self, sample_rate: f32) -> bool {
        self.pos >= self.frames(sample_rate)
    }

    #[inline]
    fn next_sample(&mut self, sample_rate: f32) -> f32 {
        let t = self.pos as f32 / sample_rate;

        let raw = match &self.source {
            Source::Sine { freq } => {
                let s = (self.phase * TAU).sin();
                self.phase = (self.phase + freq.value_at(t) / sample_rate).fract();
                s
            }
            Source::Triangle { freq } => {
                let s = 1.0 - 4.0 * (self.phase - 0.5).abs();
                self.phase = (self.phase + freq.value_at(t) / sample_rate).fract();
                s
            }
            Source::Noise { buffer } => buffer.get(self.pos).copied().unwrap_or(0.0),
        };

        let mut x = raw;
        for f in self.filters.iter_mut() {
            x = f.process(x);
        }

        self.pos += 1;
        x * self.gain.value_at(t)
    }
}

impl ScheduledGraph {
    pub fn is_finished(&self) -> bool {
        let sr = self.sample_rate as f32;
        self.branches.iter().all(|b| b.is_finished(sr))
    }

    // additive: each branch is summed into whatever is already in `out`
    pub fn render_into(&mut self, out: &mut [f32]) {
        let sr = self.sample_rate as f32;
        for branch in self.branches.iter_mut() {
            let remaining = branch.frames(sr).saturating_sub(branch.pos);
            for sample in out.iter_mut().take(remaining) {
                *sample += branch.next_sample(sr);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::graph::Envelope;
    use crate::shared::TrackId;

    fn graph(branches: Vec<Branch>) -> ScheduledGraph {
        ScheduledGraph {
            track: TrackId::Kick,
            at: 0,
            sample_rate: 1000,
            branches,
        }
    }

    #[test]
    fn branch_stops_after_its_duration() {
        let sine = Branch::new(
            Source::Sine { freq: Envelope::constant(100.0) },
            vec![],
            Envelope::constant(1.0),
            0.01,
        );
        let mut g = graph(vec![sine]);
        let mut out = vec![0.0; 64];
        g.render_into(&mut out);
        assert!(g.is_finished());
        assert!(out[10..].iter().all(|&s| s == 0.0));
        assert!(out[..10].iter().any(|&s| s != 0.0));
    }

    #[test]
    fn rendering_is_additive() {
        let noise = Branch::new(
            Source::Noise { buffer: vec![0.5; 8] },
            vec![],
            Envelope::constant(0.5),
            0.008,
        );
        let mut g = graph(vec![noise]);
        let mut out = vec![1.0; 8];
        g.render_into(&mut out);
        assert!(out.iter().all(|&s| (s - 1.25).abs() < 1e-6));
    }

    #[test]
    fn render_resumes_across_blocks() {
        let noise = Branch::new(
            Source::Noise { buffer: (0..20).map(|i| i as f32).collect() },
            vec![],
            Envelope::constant(1.0),
            0.02,
        );
        let mut g = graph(vec![noise]);
        let mut a = vec![0.0; 12];
        let mut b = vec![0.0; 12];
        g.render_into(&mut a);
        g.render_into(&mut b);
        assert_eq!(b[0], 12.0);
        assert_eq!(b[7], 19.0);
        assert_eq!(b[8], 0.0);
    }

    #[test]
    fn triangle_spans_full_range() {
        let tri = Branch::new(
            Source::Triangle { freq: Envelope::constant(10.0) },
            vec![],
            Envelope::constant(1.0),
            0.1,
        );
        let mut g = graph(vec![tri]);
        let mut out = vec![0.0; 100];
        g.render_into(&mut out);
        let max = out.iter().cloned().fold(f32::MIN, f32::max);
        let min = out.iter().cloned().fold(f32::MAX, f32::min);
        assert!(max > 0.95 && min < -0.95);
    }
}

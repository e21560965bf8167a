// A scheduled sound: every branch is source -> filters -> gain envelope -> bus.
// Built on the control side (noise and filter coefficients included) so the
// audio thread only has to run it.

use crate::shared::TrackId;

use super::filter::Biquad;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Curve {
    Linear,
    Exponential,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: f32,
    pub end: f32,
    pub from: f32,
    pub to: f32,
    pub curve: Curve,
}

/// Piecewise curve over seconds-since-trigger. Segments are kept in start
/// order; a later segment that starts inside an earlier one takes over
/// (how the clap re-attacks).
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    segments: Vec<Segment>,
}

impl Envelope {
    pub fn constant(value: f32) -> Self {
        Self {
            segments: vec![Segment {
                start: 0.0,
                end: 0.0,
                from: value,
                to: value,
                curve: Curve::Linear,
            }],
        }
    }

    // exponential moves from `from` to `to` over `duration` seconds, then holds
    pub fn exp_ramp(from: f32, to: f32, duration: f32) -> Self {
        Self::constant(from).then(0.0, duration, from, to, Curve::Exponential)
    }

    pub fn then(mut self, start: f32, end: f32, from: f32, to: f32, curve: Curve) -> Self {
        self.segments.push(Segment { start, end, from, to, curve });
        self.segments.sort_by(|a, b| a.start.total_cmp(&b.start));
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn value_at(&self, t: f32) -> f32 {
        let Some(first) = self.segments.first() else {
            return 0.0;
        };
        let Some(seg) = self.segments.iter().rev().find(|s| s.start <= t) else {
            return first.from;
        };
        if t >= seg.end || seg.end <= seg.start {
            return seg.to;
        }
        let x = (t - seg.start) / (seg.end - seg.start);
        match seg.curve {
            Curve::Linear => seg.from + (seg.to - seg.from) * x,
            // geometric interpolation; both ends are positive for every voice
            Curve::Exponential => seg.from * (seg.to / seg.from).powf(x),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Source {
    Sine { freq: Envelope },
    Triangle { freq: Envelope },
    Noise { buffer: Vec<f32> },
}

#[derive(Clone, Debug)]
pub struct Branch {
    pub source: Source,
    pub filters: Vec<Biquad>,
    pub gain: Envelope,
    pub duration: f32, // seconds; the source stops here
    pub(super) pos: usize,
    pub(super) phase: f32,
}

impl Branch {
    pub fn new(source: Source, filters: Vec<Biquad>, gain: Envelope, duration: f32) -> Self {
        Self {
            source,
            filters,
            gain,
            duration,
            pos: 0,
            phase: 0.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ScheduledGraph {
    pub track: TrackId,
    pub at: u64, // bus frame at which the graph starts
    pub sample_rate: u32,
    pub branches: Vec<Branch>,
}

impl ScheduledGraph {
    pub fn duration(&self) -> f32 {
        self.branches.iter().map(|b| b.duration).fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn exp_ramp_hits_both_ends_and_holds() {
        let env = Envelope::exp_ramp(0.3, 0.01, 0.5);
        assert_relative_eq!(env.value_at(0.0), 0.3);
        assert_relative_eq!(env.value_at(0.5), 0.01);
        assert_relative_eq!(env.value_at(2.0), 0.01);
    }

    #[test]
    fn exp_ramp_is_geometric() {
        let env = Envelope::exp_ramp(150.0, 50.0, 0.1);
        // halfway in time is the geometric mean
        assert_relative_eq!(env.value_at(0.05), (150.0f32 * 50.0).sqrt(), epsilon = 1e-3);
    }

    #[test]
    fn exp_ramp_never_reaches_zero() {
        let env = Envelope::exp_ramp(0.8, 0.01, 0.3);
        for i in 0..100 {
            assert!(env.value_at(i as f32 * 0.01) >= 0.01);
        }
    }

    #[test]
    fn later_segment_reattacks() {
        let env = Envelope::constant(1.0)
            .then(0.0, 0.02, 1.0, 0.1, Curve::Exponential)
            .then(0.02, 0.04, 1.0, 0.1, Curve::Exponential);
        assert!(env.value_at(0.019) < 0.2);
        assert_relative_eq!(env.value_at(0.02), 1.0);
    }

    #[test]
    fn constant_is_flat() {
        let env = Envelope::constant(50.0);
        assert_relative_eq!(env.value_at(0.0), 50.0);
        assert_relative_eq!(env.value_at(10.0), 50.0);
    }
}

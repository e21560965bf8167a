use std::f32::consts::PI;

// Browser biquads default to Q = 1, the voices were tuned against that
pub const DEFAULT_Q: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    HighPass,
    BandPass,
}

/// Second-order IIR section (RBJ cookbook coefficients, direct form I).
#[derive(Clone, Debug)]
pub struct Biquad {
    pub kind: FilterKind,
    pub cutoff: f32,
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    pub fn new(kind: FilterKind, cutoff: f32, q: f32, sample_rate: u32) -> Self {
        let sr = sample_rate as f32;
        // keep the centre strictly below nyquist so the coefficients stay stable
        let fc = cutoff.clamp(10.0, sr * 0.49);
        let w0 = 2.0 * PI * fc / sr;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q.max(0.01));

        let (b0, b1, b2) = match kind {
            FilterKind::HighPass => (
                (1.0 + cos_w0) / 2.0,
                -(1.0 + cos_w0),
                (1.0 + cos_w0) / 2.0,
            ),
            // constant 0 dB peak gain
            FilterKind::BandPass => (alpha, 0.0, -alpha),
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        Self {
            kind,
            cutoff: fc,
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    pub fn high_pass(cutoff: f32, sample_rate: u32) -> Self {
        Self::new(FilterKind::HighPass, cutoff, DEFAULT_Q, sample_rate)
    }

    pub fn band_pass(cutoff: f32, sample_rate: u32) -> Self {
        Self::new(FilterKind::BandPass, cutoff, DEFAULT_Q, sample_rate)
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }
}

//! Polyphase IIR half-band filters and a 2x/4x/8x oversampler built on them.
//!
//! Two cascades of second-order allpasses run in parallel; averaging their
//! outputs (one branch delayed a sample) gives a low-pass at a quarter of the
//! sample rate. Coefficients are the order-8, non-steep set from the
//! musicdsp.org "BandLimit" design.

const COEFFS_A: [f64; 4] = [
    0.077_115_079_832_416_22,
    0.482_070_625_061_047_2,
    0.796_820_471_331_579_7,
    0.941_251_427_774_047_1,
];

const COEFFS_B: [f64; 4] = [
    0.265_968_526_521_094_6,
    0.665_104_153_263_495_7,
    0.884_101_508_550_615_9,
    0.982_005_414_188_607_5,
];

#[derive(Debug, Clone, Copy, Default)]
struct AllPassSection {
    a: f64,
    x: [f64; 3],
    y: [f64; 3],
}

impl AllPassSection {
    fn new(a: f64) -> Self {
        Self {
            a,
            ..Default::default()
        }
    }

    #[inline]
    fn process(&mut self, input: f64) -> f64 {
        self.x = [input, self.x[0], self.x[1]];
        self.y = [self.y[0], self.y[0], self.y[1]];
        let out = self.x[2] + (input - self.y[2]) * self.a;
        self.y[0] = out;
        out
    }

    fn clear(&mut self) {
        self.x = [0.0; 3];
        self.y = [0.0; 3];
    }
}

#[derive(Debug, Clone, Copy)]
struct AllPassCascade {
    sections: [AllPassSection; 4],
}

impl AllPassCascade {
    fn new(coeffs: &[f64; 4]) -> Self {
        Self {
            sections: coeffs.map(AllPassSection::new),
        }
    }

    #[inline]
    fn process(&mut self, input: f64) -> f64 {
        self.sections
            .iter_mut()
            .fold(input, |acc, section| section.process(acc))
    }

    fn clear(&mut self) {
        self.sections.iter_mut().for_each(AllPassSection::clear);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HalfBandFilter {
    branch_a: AllPassCascade,
    branch_b: AllPassCascade,
    old_out: f64,
}

impl HalfBandFilter {
    pub fn new() -> Self {
        Self {
            branch_a: AllPassCascade::new(&COEFFS_A),
            branch_b: AllPassCascade::new(&COEFFS_B),
            old_out: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let input = input as f64;
        let out = (self.branch_a.process(input) + self.old_out) * 0.5;
        self.old_out = self.branch_b.process(input);
        out as f32
    }

    pub fn clear(&mut self) {
        self.branch_a.clear();
        self.branch_b.clear();
        self.old_out = 0.0;
    }
}

impl Default for HalfBandFilter {
    fn default() -> Self {
        Self::new()
    }
}

pub const MAX_OVERSAMPLING_STAGES: usize = 3;
const MAX_FACTOR: usize = 1 << MAX_OVERSAMPLING_STAGES;

/// Runs a per-sample nonlinearity at 2, 4 or 8 times the host rate.
///
/// Each stage zero-stuffs and low-passes on the way up and low-passes then
/// drops every other sample on the way down.
#[derive(Debug, Clone)]
pub struct Oversampler {
    stages: usize,
    up: [HalfBandFilter; MAX_OVERSAMPLING_STAGES],
    down: [HalfBandFilter; MAX_OVERSAMPLING_STAGES],
}

impl Oversampler {
    pub fn new(stages: usize) -> Self {
        Self {
            stages: stages.min(MAX_OVERSAMPLING_STAGES),
            up: [HalfBandFilter::new(); MAX_OVERSAMPLING_STAGES],
            down: [HalfBandFilter::new(); MAX_OVERSAMPLING_STAGES],
        }
    }

    pub fn stages(&self) -> usize {
        self.stages
    }

    pub fn set_stages(&mut self, stages: usize) {
        self.stages = stages.min(MAX_OVERSAMPLING_STAGES);
        self.clear();
    }

    pub fn factor(&self) -> usize {
        1 << self.stages
    }

    pub fn process(&mut self, input: f32, mut shaper: impl FnMut(f32) -> f32) -> f32 {
        if self.stages == 0 {
            return shaper(input);
        }

        let mut buf = [0.0f32; MAX_FACTOR];
        buf[0] = input;
        let mut len = 1;

        for filter in self.up.iter_mut().take(self.stages) {
            let mut next = [0.0f32; MAX_FACTOR];
            for i in 0..len {
                next[2 * i] = filter.process(buf[i]) * 2.0;
                next[2 * i + 1] = filter.process(0.0) * 2.0;
            }
            buf = next;
            len *= 2;
        }

        for sample in buf[..len].iter_mut() {
            *sample = shaper(*sample);
        }

        for filter in self.down.iter_mut().take(self.stages).rev() {
            let mut next = [0.0f32; MAX_FACTOR];
            for i in 0..len / 2 {
                next[i] = filter.process(buf[2 * i]);
                filter.process(buf[2 * i + 1]);
            }
            buf = next;
            len /= 2;
        }

        buf[0]
    }

    pub fn clear(&mut self) {
        self.up.iter_mut().for_each(HalfBandFilter::clear);
        self.down.iter_mut().for_each(HalfBandFilter::clear);
    }
}

impl Default for Oversampler {
    fn default() -> Self {
        Self::new(0)
    }
}

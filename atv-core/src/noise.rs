//! Seekable linear congruential generator for signal noise.
//!
//! The receiver synthesises each frame in independent chunks. Seeking the
//! generator to a chunk's first sample in O(log n) keeps the noise stream
//! identical however the frame is partitioned.

/// 32-bit LCG (`x' = A*x + C mod 2^32`) with jump-ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastRng {
    state: u32,
}

impl FastRng {
    const A: u32 = 1_103_515_245;
    const C: u32 = 12_345;
    const MID: u32 = 0x7fff_ffff;

    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Generator positioned `dist` steps after `seed`.
    pub fn seeked(seed: u32, dist: u64) -> Self {
        let mut rng = Self::new(seed);
        rng.seek(dist);
        rng
    }

    /// Advance `dist` steps by composing the affine map with itself.
    pub fn seek(&mut self, mut dist: u64) {
        let (mut step_a, mut step_c) = (Self::A, Self::C);
        let (mut acc_a, mut acc_c) = (1u32, 0u32);

        while dist != 0 {
            if dist & 1 != 0 {
                acc_a = acc_a.wrapping_mul(step_a);
                acc_c = step_a.wrapping_mul(acc_c).wrapping_add(step_c);
            }
            // f∘f: a -> a^2, c -> c*(a+1)
            step_c = step_c.wrapping_mul(step_a.wrapping_add(1));
            step_a = step_a.wrapping_mul(step_a);
            dist >>= 1;
        }

        self.state = acc_a.wrapping_mul(self.state).wrapping_add(acc_c);
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    fn step(&mut self) {
        self.state = self.state.wrapping_mul(Self::A).wrapping_add(Self::C);
    }

    /// Uniform value in `[-range, range]`, then advance one step.
    #[inline]
    pub fn symmetric(&mut self, range: f32) -> f32 {
        let centred = self.state.wrapping_sub(Self::MID) as i32;
        let v = centred as f32 * (range / Self::MID as f32);
        self.step();
        v
    }
}

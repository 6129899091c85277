//! Phase A: build the received signal from noise and tuned stations.
//!
//! The frame is cut into fixed chunks, each filled independently. Noise
//! for a chunk comes from a generator seeked to the chunk's first sample,
//! so the result never depends on how chunks are scheduled.

use rayon::prelude::*;

use crate::geometry::{GHOST_TAPS, SIGNAL_LEN};
use crate::noise::FastRng;
use crate::reception::Reception;

/// Samples per work unit; a multiple of 4 for the ghost FIR stride.
pub(crate) const CHUNK_LEN: usize = 2048;

const TRANSIT_NOISE: f32 = 50.0;
const TRANSIT_START_AMPL: f32 = 1.3;
const TRANSIT_DECAY: f32 = 0.99995;

/// Snapshot of one reception, borrowed from its locked station.
#[derive(Clone, Copy)]
pub(crate) struct Tuned<'a> {
    pub signal: &'a [i8],
    pub offset: usize,
    pub level: f32,
    pub ghost: [f32; GHOST_TAPS],
    pub hf_loss: f32,
}

impl<'a> Tuned<'a> {
    pub fn new(reception: &Reception, signal: &'a [i8]) -> Self {
        Self {
            signal,
            offset: reception.sample_offset(),
            level: reception.level as f32,
            ghost: reception.ghost.map(|g| g as f32),
            hf_loss: reception.hf_loss as f32,
        }
    }

    /// Sum of the 4-sample group starting at `idx`.
    #[inline]
    fn group_sum(&self, idx: usize) -> f32 {
        self.signal[idx..idx + 4].iter().map(|&s| s as i32).sum::<i32>() as f32
    }
}

/// Per-frame inputs shared by every chunk.
#[derive(Clone, Copy)]
pub(crate) struct SynthParams {
    pub noise_level: f64,
    pub noise_seed: u32,
    pub transit_seed: u32,
    /// Samples at the start of the frame still inside a channel change
    pub channel_change: usize,
}

/// Amplitude of the retuning static `n` samples into a channel change.
pub fn transit_amplitude(n: usize) -> f32 {
    TRANSIT_START_AMPL * TRANSIT_DECAY.powi(n as i32)
}

/// Fill `rx[..SIGNAL_LEN]` in parallel.
pub(crate) fn synthesize(rx: &mut [f32], params: SynthParams, tuned: &[Tuned<'_>]) {
    rx[..SIGNAL_LEN]
        .par_chunks_mut(CHUNK_LEN)
        .enumerate()
        .for_each(|(n, chunk)| synthesize_chunk(chunk, n * CHUNK_LEN, params, tuned));
}

fn synthesize_chunk(chunk: &mut [f32], start: usize, params: SynthParams, tuned: &[Tuned<'_>]) {
    fill_noise(chunk, start, params.noise_level, params.noise_seed);

    let end = start + chunk.len();
    // Only the first reception gets the channel-change static
    let change_end = params.channel_change & !3;
    for (n, rec) in tuned.iter().enumerate() {
        let ec = if n == 0 { change_end } else { 0 };
        let skip = if start >= ec { 0 } else { ec.min(end) - start };

        if skip > 0 {
            add_transit(chunk, start, skip, rec, params.transit_seed);
        }
        add_signal(chunk, start, skip, rec);
    }
}

/// Correlated static: the product of consecutive uniform draws.
fn fill_noise(chunk: &mut [f32], start: usize, noise_level: f64, seed: u32) {
    let range = (noise_level * 150.0).sqrt() as f32;
    let mut rng = FastRng::seeked(seed, start as u64);

    let mut prev = rng.symmetric(range);
    for sample in chunk.iter_mut() {
        let cur = rng.symmetric(range);
        *sample = cur * prev;
        prev = cur;
    }
}

/// Blend the station into loud decaying static, skipping the ghost FIR.
fn add_transit(chunk: &mut [f32], start: usize, skip: usize, rec: &Tuned<'_>, seed: u32) {
    let mut rng = FastRng::seeked(seed, start as u64);
    let mut ampl = transit_amplitude(start);

    for (i, sample) in chunk[..skip].iter_mut().enumerate() {
        let noise = rng.symmetric(TRANSIT_NOISE);
        let idx = (start + i + rec.offset) % SIGNAL_LEN;
        *sample += rec.signal[idx] as f32 * rec.level * (1.0 - ampl) + noise * ampl;
        ampl *= TRANSIT_DECAY;
    }
}

/// Add the clean station with its ghost echo and high-frequency loss.
fn add_signal(chunk: &mut [f32], start: usize, skip: usize, rec: &Tuned<'_>) {
    debug_assert_eq!((chunk.len() - skip) % 4, 0);

    // Group sums of the four groups preceding the first sample
    let mut dp = [0f32; 5];
    let mut sii = (start + skip + rec.offset) % SIGNAL_LEN;
    for d in dp.iter_mut().skip(1) {
        sii = (sii + SIGNAL_LEN - 4) % SIGNAL_LEN;
        *d = rec.group_sum(sii);
    }

    let g = rec.ghost;
    for (n, out) in chunk[skip..].chunks_exact_mut(4).enumerate() {
        let idx = (start + skip + n * 4 + rec.offset) % SIGNAL_LEN;
        let s = [
            rec.signal[idx] as f32,
            rec.signal[idx + 1] as f32,
            rec.signal[idx + 2] as f32,
            rec.signal[idx + 3] as f32,
        ];
        dp[0] = s[0] + s[1] + s[2] + s[3];

        let echo = dp[1] * g[0] + dp[2] * g[1] + dp[3] * g[2] + dp[4] * g[3];
        dp.copy_within(0..4, 1);

        for k in 0..4 {
            out[k] += (s[k] + echo + s[(k + 2) % 4] * rec.hf_loss) * rec.level;
        }
    }
}

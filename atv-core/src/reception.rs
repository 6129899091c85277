//! One tuned station as seen by a receiver.

use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;

use crate::geometry::{GHOST_TAPS, SIGNAL_LEN};
use crate::station::StationSignal;

/// Station shared between its source and any receptions of it.
pub type SharedStation = Arc<RwLock<StationSignal>>;

/// A station plus the channel conditions it arrives through.
#[derive(Debug, Clone)]
pub struct Reception {
    pub station: SharedStation,
    /// Timing offset in samples; wraps modulo one frame
    pub offset: f64,
    /// Signal gain (non-negative)
    pub level: f64,
    /// Multipath strength, 0..1
    pub multipath: f64,
    /// Offset drift in samples per frame
    pub freq_error: f64,
    /// Smoothed ghost FIR taps used by the receiver
    pub ghost: [f64; GHOST_TAPS],
    /// Drifting target the smoothed taps follow
    pub ghost_target: [f64; GHOST_TAPS],
    pub hf_loss: f64,
    pub hf_loss_target: f64,
}

impl Reception {
    /// Clean reception of `station` at `level`.
    pub fn new(station: SharedStation, level: f64) -> Self {
        Self {
            station,
            offset: 0.0,
            level: level.max(0.0),
            multipath: 0.0,
            freq_error: 0.0,
            ghost: [0.0; GHOST_TAPS],
            ghost_target: [0.0; GHOST_TAPS],
            hf_loss: 0.0,
            hf_loss_target: 0.0,
        }
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_multipath(mut self, multipath: f64) -> Self {
        self.multipath = multipath.clamp(0.0, 1.0);
        self
    }

    pub fn with_freq_error(mut self, freq_error: f64) -> Self {
        self.freq_error = freq_error;
        self
    }

    /// Set the gain, clamped non-negative.
    pub fn set_level(&mut self, level: f64) {
        self.level = level.max(0.0);
    }

    /// Drift the timing offset by one frame of frequency error.
    pub fn advance(&mut self) {
        self.offset = (self.offset + self.freq_error).rem_euclid(SIGNAL_LEN as f64);
    }

    /// Whole-sample offset into the station, in `0..SIGNAL_LEN`.
    pub fn sample_offset(&self) -> usize {
        (self.offset.rem_euclid(SIGNAL_LEN as f64) as usize) % SIGNAL_LEN
    }

    /// Update the ghost filter for the next frame.
    ///
    /// Without multipath the taps hold a small fixed echo, the reflection a
    /// length of RF cable produces. With multipath the target taps random
    /// walk back towards zero, occasionally jumping as a new reflection
    /// appears, and the live taps follow them.
    pub fn update<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.multipath > 0.0 {
            for tap in self.ghost_target.iter_mut() {
                *tap += -(*tap / 16.0) + self.multipath * rng.gen_range(-0.01..0.01);
            }
            if rng.gen_ratio(1, 20) {
                let tap = rng.gen_range(0..GHOST_TAPS);
                self.ghost_target[tap] = self.multipath * rng.gen_range(-0.04..0.04);
            }
            for (g, t) in self.ghost.iter_mut().zip(self.ghost_target.iter()) {
                *g = 0.8 * *g + 0.2 * t;
            }
        } else {
            for (i, g) in self.ghost.iter_mut().enumerate() {
                *g = if i >= GHOST_TAPS / 2 {
                    (if i & 1 == 1 { 0.04 } else { -0.08 }) / GHOST_TAPS as f64
                } else {
                    0.0
                };
            }
        }
    }

    /// Signal power contributed by this reception, ghost echo included.
    pub fn power(&self) -> f64 {
        self.level * self.level * (1.0 + 4.0 * self.ghost.iter().sum::<f64>())
    }
}

//! Phase B: vertical/horizontal sync and colorburst phase recovery.
//!
//! Both sync circuits are free-running oscillators that fire early when
//! the signal dips far enough below blanking; a hill-climb over a small
//! window rather than a correlator, so weak or scrambled sync makes the
//! picture roll and tear the way a real set does.

use crate::geometry::{CB_LEN, CB_START, LINES, PIC_START, SAMPLES_PER_LINE, SCALE};

const V: usize = LINES;
const H: usize = SAMPLES_PER_LINE;

/// Sync and burst state carried from frame to frame.
#[derive(Debug, Clone)]
pub(crate) struct SyncState {
    /// Frame line the vertical oscillator last fired on
    pub vsync: usize,
    /// Horizontal oscillator phase in samples
    pub hsync: usize,
    /// Sample where each line's picture starts
    pub line_hsync: Vec<usize>,
    /// Running colorburst average, one value per subcarrier phase
    pub cb_phase: [f32; 4],
    /// Burst vector per line, normalised to fixed energy
    pub line_cb_phase: Vec<[f32; 4]>,
}

impl Default for SyncState {
    fn default() -> Self {
        Self {
            vsync: 0,
            hsync: 0,
            line_hsync: vec![0; V],
            cb_phase: [0.0; 4],
            line_cb_phase: vec![[0.0; 4]; V],
        }
    }
}

impl SyncState {
    /// Lock onto `rx` (one frame plus two wrap lines).
    pub fn lock(&mut self, rx: &[f32], agc: f32) {
        self.lock_vertical(rx, agc);

        let mut hsync = self.hsync;
        for line in 0..V {
            // Skip the vertical sync interval
            if line > 5 * SCALE && line < V - 3 * SCALE {
                hsync = Self::lock_horizontal(rx, agc, line, self.vsync, hsync);
            }
            self.line_hsync[line] = (hsync + PIC_START + H) % H;

            if line > 15 * SCALE {
                let base = line * H + (hsync & !3);
                // Middle 5 of the 9 burst cycles
                for i in CB_START + 8 * SCALE..CB_START + CB_LEN - 8 * SCALE {
                    let cb = &mut self.cb_phase[i & 3];
                    *cb = *cb * (1.0 - 1.0 / 128.0) + rx[base + i] * agc * (1.0 / 128.0);
                }
            }

            let tot = 0.1 + self.cb_phase.iter().map(|c| c * c).sum::<f32>();
            let gain = 32.0 / tot.sqrt();
            self.line_cb_phase[line] = self.cb_phase.map(|c| c * gain);
        }
        self.hsync = hsync;
    }

    fn lock_vertical(&mut self, rx: &[f32], agc: f32) {
        let range = 32 * SCALE as i64;
        let mut vi = 0;
        for i in -range..range {
            vi = i;
            let line = (self.vsync as i64 + i + V as i64) as usize % V;

            let filt: f32 = (0..H)
                .step_by(H / (16 * SCALE))
                .map(|j| rx[line * H + j])
                .sum::<f32>()
                * agc;

            let osc = (V as i64 + i) as f32 / V as f32;
            if osc >= 1.05 + 0.0002 * filt {
                break;
            }
        }
        self.vsync = (self.vsync as i64 + vi + V as i64) as usize % V;
    }

    fn lock_horizontal(rx: &[f32], agc: f32, line: usize, vsync: usize, hsync: usize) -> usize {
        let mut line2 = (line + vsync) % V;
        if line2 == 0 {
            line2 = V;
        }
        let sidx = (line2 * H + hsync) as i64;

        let range = 8 * SCALE as i64;
        let mut hi = 0;
        for i in -range..range {
            hi = i;
            let osc = (H as i64 + i) as f32 / H as f32;
            let at = (sidx + i) as usize;
            let filt = (rx[at - 3] + rx[at - 2] + rx[at - 1] + rx[at]) * agc;
            if osc >= 1.005 + 0.0001 * filt {
                break;
            }
        }
        (hsync as i64 + hi + H as i64) as usize % H
    }
}

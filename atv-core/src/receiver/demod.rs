//! Phase C: composite to YIQ.
//!
//! Fixed IIR low-pass filters designed with mkfilter: Y is a 4-pole
//! Butterworth at 3.5 MHz, I and Q 3-pole Butterworths at 1.5 MHz, each
//! with extra zeros at the subcarrier so a flat colour decodes flat.

use crate::geometry::BLACK_LEVEL;

/// Squared burst magnitude below which a line decodes as monochrome.
const COLOR_THRESHOLD: f64 = 2.8;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Yiq {
    pub y: f32,
    pub i: f32,
    pub q: f32,
}

/// Per-frame demodulator settings.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Demodulator {
    pub agc: f32,
    /// Added to Y: brightness * 100 - black level
    pub bright_add: f32,
    pub tint_i: f64,
    pub tint_q: f64,
    pub color: f64,
}

impl Demodulator {
    pub fn new(agc: f32, brightness: f64, tint: f64, color: f64) -> Self {
        let tint_rad = (103.0 + tint).to_radians();
        Self {
            agc,
            bright_add: (brightness * 100.0 - BLACK_LEVEL as f64) as f32,
            tint_i: -tint_rad.cos(),
            tint_q: tint_rad.sin(),
            color,
        }
    }

    /// Chroma reference table for a line's burst vector, or `None` when
    /// the burst is too weak to enable colour.
    ///
    /// `phase` is the line's signal offset modulo 4.
    pub fn chroma_reference(&self, burst: &[f32; 4], phase: usize) -> Option<[f32; 4]> {
        let cb_i = (burst[(2 + phase) & 3] - burst[phase & 3]) as f64 / 16.0;
        let cb_q = (burst[(3 + phase) & 3] - burst[(1 + phase) & 3]) as f64 / 16.0;

        if cb_i * cb_i + cb_q * cb_q <= COLOR_THRESHOLD {
            return None;
        }
        let m0 = ((cb_i * self.tint_i - cb_q * self.tint_q) * self.color) as f32;
        let m1 = ((cb_q * self.tint_i + cb_i * self.tint_q) * self.color) as f32;
        Some([m0, m1, -m0, -m1])
    }

    /// Demodulate `signal[start..end]` into `out[start..end]`.
    ///
    /// Returns whether the line decoded in colour. Filter history starts
    /// at zero at `start`.
    pub fn to_yiq(
        &self,
        signal: &[f32],
        burst: &[f32; 4],
        phase: usize,
        start: usize,
        end: usize,
        out: &mut [Yiq],
    ) -> bool {
        let mut x = [0f32; 7];
        let mut y = [0f32; 5];
        for n in start..end {
            x.copy_within(0..6, 1);
            x[0] = signal[n] * 0.046_990_425_725_193_5 * self.agc;
            let yn = (x[0] + x[6]) + 4.0 * (x[1] + x[5]) + 7.0 * (x[2] + x[4]) + 8.0 * x[3]
                - 0.017_664_8 * y[3]
                - 0.486_028_8 * y[1];
            y.copy_within(0..4, 1);
            y[0] = yn;
            out[n].y = yn + self.bright_add;
        }

        let Some(multiq) = self.chroma_reference(burst, phase) else {
            for v in out[start..end].iter_mut() {
                v.i = 0.0;
                v.q = 0.0;
            }
            return false;
        };

        let mut xi = [0f32; 6];
        let mut yi = [0f32; 2];
        let mut xq = [0f32; 6];
        let mut yq = [0f32; 2];
        for n in start..end {
            let sig = signal[n];

            xi.copy_within(0..5, 1);
            xi[0] = sig * multiq[n & 3] * (1.0 / 12.0);
            let i = (xi[0] + xi[5]) + 3.0 * (xi[1] + xi[4]) + 4.0 * (xi[2] + xi[3])
                - 0.333_333_333_3 * yi[1];
            yi[1] = yi[0];
            yi[0] = i;

            xq.copy_within(0..5, 1);
            xq[0] = sig * multiq[(n + 3) & 3] * (1.0 / 12.0);
            let q = (xq[0] + xq[5]) + 3.0 * (xq[1] + xq[4]) + 4.0 * (xq[2] + xq[3])
                - 0.333_333_333_3 * yq[1];
            yq[1] = yq[0];
            yq[0] = q;

            out[n].i = i;
            out[n].q = q;
        }
        true
    }
}

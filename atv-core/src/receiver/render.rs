//! Phase D: scanlines to pixels.
//!
//! Each visible line is demodulated, walked across in 16.16 fixed point
//! with linear interpolation, converted to RGB and expanded vertically
//! through the level table. Lines render independently; the CRT load that
//! couples them is computed beforehand in a sequential pass.

use super::demod::{Demodulator, Yiq};
use super::layout::{Layout, LevelTable};
use super::sync::SyncState;
use crate::geometry::{INTENSITY_LEVELS, LINES, MAX_LINE_HEIGHT, PIC_LEN, SAMPLES_PER_LINE, TOP, VISLINES};
use crate::raster::Raster;

/// Where one scanline lands in the scratch image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LineSpan {
    /// Line number relative to the first visible line
    pub sline: i32,
    pub ytop: usize,
    pub ybot: usize,
    /// Start of the line's picture in the received signal
    pub signal_offset: usize,
}

impl LineSpan {
    /// Rows of the scratch image covered by `line`, or `None` when the
    /// line is squeezed to nothing or falls off the image.
    pub fn locate(line: usize, use_height: usize, puheight: f64, sync: &SyncState) -> Option<Self> {
        let uh = use_height as i32;
        let sline = line as i32 - TOP as i32;
        let edge = |l: i32| ((l * uh / VISLINES as i32 - uh / 2) as f64 * puheight) as i32 + uh / 2;
        let ytop = edge(sline);
        let ybot = edge(sline + 1);

        if ytop == ybot || ybot < 0 || ytop > uh {
            return None;
        }
        let ytop = ytop.max(0);
        let ybot = ybot.min(uh).min(ytop + MAX_LINE_HEIGHT as i32);
        if ybot <= ytop {
            return None;
        }

        Some(Self {
            sline,
            ytop: ytop as usize,
            ybot: ybot as usize,
            signal_offset: ((line + sync.vsync) % LINES) * SAMPLES_PER_LINE + sync.line_hsync[line],
        })
    }

    pub fn height(&self) -> usize {
        self.ybot - self.ytop
    }
}

/// Update the per-line CRT load from the brightness of each visible line.
///
/// A shrink pulse pending on a drawn line raises the base load from there
/// down and is consumed.
pub(crate) fn update_crt_load(
    crtload: &mut [f32],
    rx: &[f32],
    agc: f32,
    spans: &[Option<LineSpan>],
    shrinkpulse: &mut Option<usize>,
    squeeze_bottom: f32,
) {
    let mut baseload = 0.5f32;
    crtload[TOP - 1] = baseload;

    for (n, span) in spans.iter().enumerate() {
        let line = TOP + n;
        let Some(span) = span else { continue };

        if *shrinkpulse == Some(line) {
            baseload += 0.4;
            *shrinkpulse = None;
        }

        let total = rx[span.signal_offset..span.signal_offset + PIC_LEN].iter().sum::<f32>() * agc;
        let squeeze = if span.sline > 184 {
            (span.sline - 184) as f32 * (line as f32 - 184.0) * 0.001 * squeeze_bottom
        } else {
            0.0
        };
        crtload[line] =
            0.95 * crtload[line - 1] + 0.05 * (baseload + (total - 30000.0) / 100_000.0 + squeeze);
    }
}

/// Everything a worker needs to draw one line of the current frame.
pub(crate) struct LineRenderer<'a> {
    pub demod: Demodulator,
    pub rx: &'a [f32],
    pub sync: &'a SyncState,
    pub levels: &'a LevelTable,
    pub intensity: &'a [u8; INTENSITY_LEVELS],
    pub layout: Layout,
    pub horiz_desync: f32,
    /// Horizontal scan size after the power-up ramp
    pub scanwidth: f32,
    /// Fraction of the visible width past the middle where squish begins
    pub squish_point: f32,
    pub pixbright: f32,
}

impl LineRenderer<'_> {
    /// Demodulate the samples a scan walk starting at `scanstart` (16.16)
    /// can reach.
    pub fn demodulate(&self, line: usize, span: &LineSpan, scanstart: i32) -> (bool, Vec<Yiq>) {
        let mut yiq = vec![Yiq::default(); PIC_LEN + 10];
        let start = ((scanstart >> 16) - 10).max(0) as usize;
        let end = PIC_LEN + 9;
        let colour = self.demod.to_yiq(
            &self.rx[span.signal_offset..],
            &self.sync.line_cb_phase[line],
            span.signal_offset & 3,
            start,
            end,
            &mut yiq,
        );
        (colour, yiq)
    }

    /// Linear RGB across the sub-width, 3 floats per pixel, unscaled.
    pub fn scan(&self, line: usize, span: &LineSpan, crtload: f32) -> Vec<f32> {
        let sw = self.layout.subwidth as i32;
        let mut rgb = vec![0f32; self.layout.subwidth * 3];

        let scw = ((sw as f32 * self.scanwidth) as i32).min(sw);
        if scw <= 0 {
            return rgb;
        }
        let scl = (sw / 2 - scw / 2) as usize;
        let scr = (sw / 2 + scw / 2) as usize;

        let sl = span.sline as f32;
        let bloom = (-10.0 * crtload).clamp(-10.0, 2.0);
        let shift = if span.sline < 16 {
            self.horiz_desync * ((-0.17 * sl).exp() * (0.7 + (sl * 0.6).cos()))
        } else {
            0.0
        };
        let viswidth = PIC_LEN as f32 * 0.79 - 5.0 * bloom;
        let middle = (PIC_LEN / 2) as f32 - shift;

        let pixrate = ((((viswidth * 65536.0) / sw as f32) as i32) as f32 / self.scanwidth) as i32;
        let scanstart = ((middle - viswidth * 0.5) * 65536.0) as i32;
        let scanend = ((PIC_LEN - 1) << 16) as i32;
        let squishright = ((middle + viswidth * self.squish_point) * 65536.0) as i32;
        let squishdiv = (sw / 15).max(1);

        let (_, yiq) = self.demodulate(line, span, scanstart);

        let mut inc = pixrate.max(1);
        let mut bright = self.pixbright;
        let mut i = scanstart;
        let mut x = scl;
        while i < 0 && x != scr {
            i += inc;
            x += 1;
        }
        while i < scanend && x != scr {
            let frac = (i & 0xffff) as f32 / 65536.0;
            let inv = 1.0 - frac;
            let p = (i >> 16) as usize;
            let (a, b) = (yiq[p], yiq[p + 1]);

            let y = a.y * inv + b.y * frac;
            let ci = a.i * inv + b.i * frac;
            let cq = a.q * inv + b.q * frac;

            // Inverse of the NTSC encoding matrix
            let px = &mut rgb[x * 3..x * 3 + 3];
            px[0] = ((y + 0.948 * ci + 0.624 * cq) * bright).max(0.0);
            px[1] = ((y - 0.276 * ci - 0.639 * cq) * bright).max(0.0);
            px[2] = ((y - 1.105 * ci + 1.729 * cq) * bright).max(0.0);

            if i >= squishright {
                inc += inc / squishdiv;
                bright += bright / squishdiv as f32 / 2.0;
            }
            i += inc;
            x += 1;
        }
        rgb
    }

    /// Expand a scanned line to its rows of RGBA, one block per line.
    ///
    /// Rows sharing a level are computed once and copied.
    pub fn blast(&self, rgb: &[f32], span: &LineSpan) -> Vec<u8> {
        let stride = self.layout.use_width * Raster::CHANNELS;
        let xrepl = self.layout.xrepl;
        let height = span.height();
        let mut block = vec![0u8; height * stride];
        let mut computed: [Option<usize>; 3] = [None; 3];

        for row in 0..height {
            let entry = self.levels.get(height, row);
            if let Some(src) = computed[entry.index] {
                block.copy_within(src * stride..(src + 1) * stride, row * stride);
                continue;
            }
            computed[entry.index] = Some(row);

            let level = |c: f32| {
                let v = ((c as i32) as f32 * entry.value) as i32;
                self.intensity[v.clamp(0, INTENSITY_LEVELS as i32 - 1) as usize]
            };
            let dst = &mut block[row * stride..(row + 1) * stride];
            for (n, px) in rgb.chunks_exact(3).enumerate() {
                let rgba = [level(px[0]), level(px[1]), level(px[2]), 255];
                for r in 0..xrepl {
                    let o = (n * xrepl + r) * Raster::CHANNELS;
                    dst[o..o + Raster::CHANNELS].copy_from_slice(&rgba);
                }
            }
        }
        block
    }

    pub fn render(&self, line: usize, span: &LineSpan, crtload: f32) -> Vec<u8> {
        let rgb = self.scan(line, span, crtload);
        self.blast(&rgb, span)
    }
}

/// Gamma 0.8 lookup from linear drive to 8-bit output.
pub(crate) fn intensity_table() -> [u8; INTENSITY_LEVELS] {
    let mut table = [0u8; INTENSITY_LEVELS];
    for (i, v) in table.iter_mut().enumerate() {
        let intensity = ((i as f64 / 256.0).powf(0.8) * 65535.0) as i32;
        *v = (intensity.min(65535) >> 8) as u8;
    }
    table
}

/// Copy the lit band of `image` to the centre of `output`, clipping both.
pub(crate) fn blit(image: &Raster, output: &mut Raster, puheight: f64) {
    let uw = image.width as i64;
    let uh = image.height as i64;

    let mut top = ((uh as f64 * (1.0 - puheight) / 2.0) as i64).max(0);
    let bot = ((uh as f64 * (1.0 + puheight) / 2.0) as i64).min(uh);
    if bot <= top {
        return;
    }

    let mut xo = (output.width as i64 - uw) / 2;
    let yo = (output.height as i64 - uh) / 2;
    let mut src_x = 0;
    let mut dest_y = yo + top;
    let mut w = uw;
    let mut h = bot - top;

    if xo < 0 {
        w += xo;
        src_x = -xo;
        xo = 0;
    }
    w = w.min(output.width as i64 - xo).min(uw - src_x);

    if dest_y < 0 {
        h += dest_y;
        top -= dest_y;
        dest_y = 0;
    }
    h = h.min(output.height as i64 - dest_y).min(uh - top);

    if w <= 0 || h <= 0 {
        return;
    }

    let ch = Raster::CHANNELS;
    let (src_x, xo, w) = (src_x as usize * ch, xo as usize * ch, w as usize * ch);
    for row in 0..h as usize {
        let src = &image.row(top as usize + row)[src_x..src_x + w];
        output.row_mut(dest_y as usize + row)[xo..xo + w].copy_from_slice(src);
    }
}

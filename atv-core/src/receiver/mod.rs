//! Receiver/decoder
//!
//! Turns a set of receptions into a rendered frame: synthesize the
//! received signal, recover sync and colorburst, demodulate to YIQ and
//! paint each scanline with the distortions of a period CRT.

mod demod;
mod layout;
mod render;
mod sync;
mod synth;

pub use demod::Yiq;
pub use layout::{Layout, LevelEntry, LevelTable};
pub use synth::transit_amplitude;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, trace};

use crate::controls::TvControls;
use crate::error::AtvError;
use crate::geometry::{
    BOT, CHANNEL_CHANGE_CYCLES, INTENSITY_LEVELS, LINES, SAMPLES_PER_LINE, SIGNAL_LEN, TOP,
    VISLINES,
};
use crate::raster::Raster;
use crate::reception::Reception;

use demod::Demodulator;
use render::{LineRenderer, LineSpan};
use sync::SyncState;
use synth::{SynthParams, Tuned};

/// Power-up ramp: 0 before `start` seconds, rising with time constant
/// `tc` (scaled by `over`, squared) and saturating at 1.
pub fn puramp(powerup: f64, tc: f64, start: f64, over: f64) -> f64 {
    let pt = powerup - start;
    if pt < 0.0 {
        return 0.0;
    }
    if pt > 900.0 || pt / tc > 8.0 {
        return 1.0;
    }
    let ret = (1.0 - (-pt / tc).exp()) * over;
    if ret > 1.0 {
        return 1.0;
    }
    ret * ret
}

fn in_pool<R: Send>(pool: Option<&ThreadPool>, op: impl FnOnce() -> R + Send) -> R {
    match pool {
        Some(pool) => pool.install(op),
        None => op(),
    }
}

/// A simulated television set.
///
/// Bind an output raster, then call [`Receiver::draw`] once per frame.
/// All per-frame randomness comes from the receiver's own seeded
/// generator, so a given seed and input sequence always renders the
/// same frames regardless of worker count.
#[derive(Debug)]
pub struct Receiver {
    pub controls: TvControls,
    rng: ChaCha8Rng,
    pool: Option<ThreadPool>,

    output: Raster,
    layout: Layout,
    image: Raster,

    /// One frame of received signal plus two wrap lines
    rx: Vec<f32>,
    sync: SyncState,
    agc: f32,
    rx_signal_level: f64,
    channel_change_cycles: usize,

    intensity: [u8; INTENSITY_LEVELS],
    levels: LevelTable,
    crtload: Vec<f32>,
    puheight: f64,

    hashnoise_on: bool,
    shrinkpulse: Option<usize>,
}

impl Receiver {
    /// New receiver with default controls and a randomly set desync and
    /// bottom squeeze.
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let controls = TvControls {
            horiz_desync: rng.gen_range(-5.0..5.0),
            squeeze_bottom: rng.gen_range(-1.0..4.0),
            ..TvControls::default()
        };

        Self {
            controls,
            rng,
            pool: None,
            output: Raster::default(),
            layout: Layout::default(),
            image: Raster::default(),
            rx: vec![0.0; SIGNAL_LEN + 2 * SAMPLES_PER_LINE],
            sync: SyncState::default(),
            agc: 0.0,
            rx_signal_level: 0.0,
            channel_change_cycles: 0,
            intensity: render::intensity_table(),
            levels: LevelTable::default(),
            crtload: vec![0.0; LINES],
            puheight: 0.0,
            hashnoise_on: false,
            shrinkpulse: None,
        }
    }

    /// Run frame work on a dedicated pool of `threads` workers instead of
    /// the global one.
    pub fn with_threads(mut self, threads: usize) -> Result<Self, AtvError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| AtvError::ThreadPool(e.to_string()))?;
        self.pool = Some(pool);
        Ok(self)
    }

    /// Attach the raster frames are drawn into and recompute geometry.
    pub fn bind_output(&mut self, output: Raster) {
        self.output = output;
        self.reconfigure();
    }

    pub fn output(&self) -> &Raster {
        &self.output
    }

    /// Take the output raster back, leaving the receiver unbound.
    pub fn take_output(&mut self) -> Raster {
        let output = std::mem::take(&mut self.output);
        self.reconfigure();
        output
    }

    /// Recompute the scratch image size from the bound output.
    ///
    /// Idempotent; a no-op for unchanged geometry.
    pub fn reconfigure(&mut self) {
        let layout = Layout::for_output(self.output.width, self.output.height);
        if layout == self.layout && self.image.width == layout.use_width {
            return;
        }

        debug!(
            output_width = self.output.width,
            output_height = self.output.height,
            use_width = layout.use_width,
            use_height = layout.use_height,
            xrepl = layout.xrepl,
            "receiver geometry"
        );
        self.layout = layout;
        self.image = Raster::new(layout.use_width, layout.use_height);
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Start a channel change: the next frames fade from loud static into
    /// the first reception.
    pub fn change_channel(&mut self) {
        self.channel_change_cycles = CHANNEL_CHANGE_CYCLES;
    }

    /// Samples of channel-change static still to be drawn.
    pub fn channel_change_remaining(&self) -> usize {
        self.channel_change_cycles
    }

    /// Received signal of the last frame (plus two wrap lines).
    pub fn raw_signal(&self) -> &[f32] {
        &self.rx
    }

    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }

    fn puramp(&self, tc: f64, start: f64, over: f64) -> f64 {
        puramp(self.controls.powerup, tc, start, over)
    }

    /// Per-frame drift: desync flutter, shrink pulses, AGC.
    fn setup_frame(&mut self) {
        if self.controls.flutter_horiz_desync {
            let kick: f64 = (0..3)
                .map(|_| self.rng.gen_range(-0x80..0x80) as f64)
                .product();
            self.controls.horiz_desync += -0.10 * (self.controls.horiz_desync - 3.0) + kick * 1e-6;
        }

        if self.controls.hashnoise_enable && !self.hashnoise_on && self.rng.gen_ratio(1, 10_000) {
            self.hashnoise_on = true;
            self.shrinkpulse = Some(self.rng.gen_range(0..LINES));
        }
        if self.rng.gen_ratio(1, 1000) {
            self.hashnoise_on = false;
        }

        if self.rx_signal_level != 0.0 {
            self.agc = (1.0 / self.rx_signal_level) as f32;
        }
    }

    /// Vertical scan size and level table for the current controls.
    fn setup_scan(&mut self) {
        self.puheight = self.puramp(2.0, 1.0, 1.3)
            * self.controls.height
            * (1.125 - 0.125 * self.puramp(2.0, 2.0, 1.1));
        let avg_height = self.puheight * self.layout.use_height as f64 / VISLINES as f64;
        let ramp = self.puramp(3.0, 6.0, 1.0);
        self.levels.setup(avg_height, ramp);
    }

    fn line_span(&self, line: usize) -> Option<LineSpan> {
        LineSpan::locate(line, self.layout.use_height, self.puheight, &self.sync)
    }

    fn renderer(&self) -> LineRenderer<'_> {
        let c = &self.controls;
        LineRenderer {
            demod: Demodulator::new(self.agc, c.brightness, c.tint, c.color),
            rx: &self.rx,
            sync: &self.sync,
            levels: &self.levels,
            intensity: &self.intensity,
            layout: self.layout,
            horiz_desync: c.horiz_desync as f32,
            scanwidth: (c.width * self.puramp(0.5, 0.3, 1.0)) as f32,
            squish_point: (0.25 + 0.25 * self.puramp(2.0, 0.0, 1.1) - c.squish) as f32,
            pixbright: (c.contrast * self.puramp(1.0, 0.0, 1.0) / (0.5 + 0.5 * self.puheight)
                * 1024.0
                / 100.0) as f32,
        }
    }

    /// Render one frame of `receptions` at `noise_level` into the output.
    ///
    /// With no receptions the frame is static only. Does nothing until an
    /// output is bound.
    pub fn draw(&mut self, noise_level: f64, receptions: &[Reception]) {
        if self.output.is_empty() || self.layout.is_empty() {
            trace!("no output bound, skipping frame");
            return;
        }

        self.rx_signal_level = receptions
            .iter()
            .fold(noise_level, |acc, r| (acc * acc + r.power()).sqrt());
        self.setup_frame();

        let params = SynthParams {
            noise_level,
            noise_seed: self.rng.gen(),
            transit_seed: self.rng.gen(),
            channel_change: self.channel_change_cycles,
        };
        {
            let guards: Vec<_> = receptions.iter().map(|r| r.station.read_recursive()).collect();
            let tuned: Vec<Tuned<'_>> = receptions
                .iter()
                .zip(guards.iter())
                .map(|(r, station)| Tuned::new(r, station.samples()))
                .collect();
            let rx = &mut self.rx;
            in_pool(self.pool.as_ref(), || synth::synthesize(rx, params, &tuned));
        }
        self.channel_change_cycles = 0;

        let (frame, wrap) = self.rx.split_at_mut(SIGNAL_LEN);
        wrap.copy_from_slice(&frame[..2 * SAMPLES_PER_LINE]);

        self.sync.lock(&self.rx, self.agc);
        self.setup_scan();

        let spans: Vec<Option<LineSpan>> = (TOP..BOT).map(|line| self.line_span(line)).collect();
        render::update_crt_load(
            &mut self.crtload,
            &self.rx,
            self.agc,
            &spans,
            &mut self.shrinkpulse,
            self.controls.squeeze_bottom as f32,
        );

        let blocks = {
            let renderer = self.renderer();
            let crtload = &self.crtload;
            in_pool(self.pool.as_ref(), || {
                spans
                    .par_iter()
                    .enumerate()
                    .filter_map(|(n, span)| {
                        let span = span.as_ref()?;
                        let line = TOP + n;
                        Some((span.ytop, renderer.render(line, span, crtload[line])))
                    })
                    .collect::<Vec<_>>()
            })
        };

        self.image.clear();
        let stride = self.image.stride();
        for (ytop, block) in blocks {
            self.image.data[ytop * stride..ytop * stride + block.len()].copy_from_slice(&block);
        }

        render::blit(&self.image, &mut self.output, self.puheight);
    }
}

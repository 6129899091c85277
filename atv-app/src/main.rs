//! ATV - analog television simulator
//!
//! Headless session: a station carries colour bars, a receiver tunes it
//! and decodes frames, and per-frame timing is logged.

mod config;

use std::fs;
use std::io;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use parking_lot::RwLock;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use atv_core::{Raster, Reception, Receiver, SharedStation, StationSignal};
use atv_source::{BarsSource, ImageSource, Source};

use config::AppConfig;

/// Gradient shown on the second channel
const TEST_CARD_SIZE: (usize, usize) = (160, 120);

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load();
    let controls = load_controls()?;
    info!(?config, "starting session");

    run_session(&config, controls.as_deref())
}

/// Read the knobs saved next to the config, if any.
fn load_controls() -> anyhow::Result<Option<String>> {
    let path = AppConfig::controls_path();
    match fs::read_to_string(&path) {
        Ok(content) => {
            debug!(path = %path.display(), "loaded TV controls");
            Ok(Some(content))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

/// Receiver bound to the configured output.
///
/// `controls` overrides only the knobs it names; the rest keep the
/// receiver's seeded defaults.
fn build_receiver(config: &AppConfig, controls: Option<&str>) -> anyhow::Result<Receiver> {
    let mut receiver = Receiver::new(config.seed);
    if config.threads > 0 {
        receiver = receiver.with_threads(config.threads)?;
    }
    if let Some(controls) = controls {
        receiver
            .controls
            .apply(controls)
            .context("applying TV controls")?;
    }
    receiver.bind_output(Raster::new(config.width, config.height));
    Ok(receiver)
}

/// A horizontal hue sweep over a vertical brightness ramp.
fn test_card() -> Raster {
    let (w, h) = TEST_CARD_SIZE;
    let mut card = Raster::new(w, h);
    for y in 0..h {
        let v = 255 - (y * 255 / h) as u8;
        for x in 0..w {
            let t = (x * 3 * 256 / w) as u32;
            let (seg, f) = ((t / 256) as usize, (t % 256) as u8);
            let rgb = match seg {
                0 => [255 - f, f, 0],
                1 => [0, 255 - f, f],
                _ => [f, 0, 255 - f],
            };
            let scale = |c: u8| (c as u32 * v as u32 / 255) as u8;
            card.set_pixel(x, y, [scale(rgb[0]), scale(rgb[1]), scale(rgb[2]), 255]);
        }
    }
    card
}

fn run_session(config: &AppConfig, controls: Option<&str>) -> anyhow::Result<()> {
    let station: SharedStation = Arc::new(RwLock::new(StationSignal::new()));

    let mut bars = BarsSource::new();
    bars.set_out_size(config.width, config.height)?;
    let mut card = ImageSource::new(test_card())?;
    card.set_out_size(config.width, config.height)?;
    let mut channels: [Source; 2] = [bars.into(), card.into()];
    let mut tuned = 0;

    let mut receiver = build_receiver(config, controls)?;

    let mut reception = Reception::new(station.clone(), 1.0).with_multipath(config.multipath);
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let fps = config.fps.max(1.0);

    let session_start = Instant::now();
    for frame in 0..config.frames {
        if config.channel_change_at == Some(frame) {
            tuned = (tuned + 1) % channels.len();
            receiver.change_channel();
            info!(frame, channel = tuned, "changing channel");
        }

        receiver.controls.powerup = frame as f64 / fps;
        channels[tuned].update(&mut station.write());
        reception.update(&mut rng);

        let start = Instant::now();
        receiver.draw(config.noise, std::slice::from_ref(&reception));
        reception.advance();

        info!(
            frame,
            draw_ms = start.elapsed().as_secs_f64() * 1000.0,
            brightness = receiver.output().mean_brightness(),
            "frame"
        );
    }

    info!(
        frames = config.frames,
        elapsed_s = session_start.elapsed().as_secs_f64(),
        "session complete"
    );
    Ok(())
}

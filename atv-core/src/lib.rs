//! Analog TV engine - station encoder, reception channel, receiver/decoder
//!
//! This crate simulates an NTSC broadcast chain at the signal level:
//! - Station: RGB images and solid blocks encoded to composite samples
//! - Reception: per-station gain, timing offset and multipath ghosting
//! - Receiver: noise, sync recovery, YIQ demodulation and CRT rendering

mod controls;
mod error;
pub mod geometry;
mod noise;
mod raster;
mod reception;
mod receiver;
mod station;

pub use controls::TvControls;
pub use error::AtvError;
pub use noise::FastRng;
pub use raster::Raster;
pub use reception::{Reception, SharedStation};
pub use receiver::{puramp, transit_amplitude, Layout, LevelEntry, LevelTable, Receiver, Yiq};
pub use station::{lcp_to_ntsc, Placement, StationSignal};

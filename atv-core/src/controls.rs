//! Receiver knobs and their text persistence.
//!
//! Values are the user-facing resource divided by 100, except tint which
//! is in degrees. Useful ranges: brightness -0.75..1.0, contrast 0..5,
//! colour -5..5, tint mod 360. None of them are clamped.

use std::fmt::Write as _;

use crate::error::AtvError;

/// Picture controls read by the receiver every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TvControls {
    /// Chroma phase shift in degrees
    pub tint: f64,
    /// Chroma gain
    pub color: f64,
    pub brightness: f64,
    pub contrast: f64,
    /// Vertical scan size (1.0 = nominal)
    pub height: f64,
    /// Horizontal scan size (1.0 = nominal)
    pub width: f64,
    /// Pulls the right-hand compression point further left
    pub squish: f64,
    /// Seconds since power-on; anything past ~8 is fully warmed up
    pub powerup: f64,
    /// Horizontal shift of the top lines after vertical retrace
    pub horiz_desync: f64,
    /// Let `horiz_desync` wander from frame to frame
    pub flutter_horiz_desync: bool,
    /// Bottom-of-screen squeeze strength fed into the CRT load
    pub squeeze_bottom: f64,
    /// Allow random shrink pulses
    pub hashnoise_enable: bool,
}

impl Default for TvControls {
    fn default() -> Self {
        Self {
            tint: 5.0,
            color: 0.70,
            brightness: 0.02,
            contrast: 1.50,
            height: 1.0,
            width: 1.0,
            squish: 0.0,
            powerup: 1000.0,
            horiz_desync: 0.0,
            flutter_horiz_desync: false,
            squeeze_bottom: 0.0,
            hashnoise_enable: true,
        }
    }
}

impl TvControls {
    /// Parse controls from simple key=value format.
    ///
    /// Missing keys keep their defaults, unknown keys are ignored.
    pub fn parse(content: &str) -> Result<Self, AtvError> {
        let mut controls = Self::default();
        controls.apply(content)?;
        Ok(controls)
    }

    /// Overwrite only the keys present in `content`.
    ///
    /// Nothing changes if any value is malformed.
    pub fn apply(&mut self, content: &str) -> Result<(), AtvError> {
        let mut controls = self.clone();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();

                match key {
                    "tint" => controls.tint = parse_f64(key, value)?,
                    "color" => controls.color = parse_f64(key, value)?,
                    "brightness" => controls.brightness = parse_f64(key, value)?,
                    "contrast" => controls.contrast = parse_f64(key, value)?,
                    "height" => controls.height = parse_f64(key, value)?,
                    "width" => controls.width = parse_f64(key, value)?,
                    "squish" => controls.squish = parse_f64(key, value)?,
                    "powerup" => controls.powerup = parse_f64(key, value)?,
                    "horiz_desync" => controls.horiz_desync = parse_f64(key, value)?,
                    "flutter_horiz_desync" => {
                        controls.flutter_horiz_desync = parse_bool(key, value)?
                    }
                    "squeeze_bottom" => controls.squeeze_bottom = parse_f64(key, value)?,
                    "hashnoise_enable" => controls.hashnoise_enable = parse_bool(key, value)?,
                    _ => {} // Ignore unknown keys
                }
            }
        }

        *self = controls;
        Ok(())
    }

    /// Serialize controls to simple key=value format
    pub fn serialize(&self) -> String {
        let mut out = String::from("# TV controls\n");
        let _ = writeln!(out, "tint={}", self.tint);
        let _ = writeln!(out, "color={}", self.color);
        let _ = writeln!(out, "brightness={}", self.brightness);
        let _ = writeln!(out, "contrast={}", self.contrast);
        let _ = writeln!(out, "height={}", self.height);
        let _ = writeln!(out, "width={}", self.width);
        let _ = writeln!(out, "squish={}", self.squish);
        let _ = writeln!(out, "powerup={}", self.powerup);
        let _ = writeln!(out, "horiz_desync={}", self.horiz_desync);
        let _ = writeln!(out, "flutter_horiz_desync={}", self.flutter_horiz_desync);
        let _ = writeln!(out, "squeeze_bottom={}", self.squeeze_bottom);
        let _ = writeln!(out, "hashnoise_enable={}", self.hashnoise_enable);
        out
    }
}

fn parse_f64(key: &str, value: &str) -> Result<f64, AtvError> {
    value.parse().map_err(|_| AtvError::InvalidControl {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, AtvError> {
    match value {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" => Ok(false),
        _ => Err(AtvError::InvalidControl {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

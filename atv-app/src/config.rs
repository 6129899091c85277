//! Session configuration persistence
//!
//! Stores how many frames to run and the receiver setup, next to an
//! optional `controls.txt` holding the TV knobs.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::warn;

/// Headless session settings
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Frames to render
    pub frames: usize,
    /// Frame rate used to advance the power-up clock
    pub fps: f64,
    /// Output raster size
    pub width: usize,
    pub height: usize,
    /// Seed for the receiver and the reception channel
    pub seed: u64,
    /// Worker threads; 0 uses the global pool
    pub threads: usize,
    /// Gaussian noise level fed to the receiver
    pub noise: f64,
    /// Multipath strength of the reception, 0..1
    pub multipath: f64,
    /// Frame at which to switch channels, if any
    pub channel_change_at: Option<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            frames: 120,
            fps: 30.0,
            width: 640,
            height: 480,
            seed: 1,
            threads: 0,
            noise: 0.02,
            multipath: 0.0,
            channel_change_at: None,
        }
    }
}

impl AppConfig {
    /// Load config from the default location
    ///
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        let path = Self::config_path();
        Self::load_from(&path).unwrap_or_default()
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.serialize())
    }

    fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("analogtv")
    }

    /// Get the default config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.txt")
    }

    /// Get the default TV controls file path
    pub fn controls_path() -> PathBuf {
        Self::config_dir().join("controls.txt")
    }

    /// Parse config from simple key=value format
    ///
    /// Values that fail to parse keep their default.
    fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();

                match key {
                    "frames" => config.frames = parse_value(key, value).unwrap_or(config.frames),
                    "fps" => config.fps = parse_value(key, value).unwrap_or(config.fps),
                    "width" => config.width = parse_value(key, value).unwrap_or(config.width),
                    "height" => config.height = parse_value(key, value).unwrap_or(config.height),
                    "seed" => config.seed = parse_value(key, value).unwrap_or(config.seed),
                    "threads" => config.threads = parse_value(key, value).unwrap_or(config.threads),
                    "noise" => config.noise = parse_value(key, value).unwrap_or(config.noise),
                    "multipath" => {
                        config.multipath = parse_value(key, value).unwrap_or(config.multipath)
                    }
                    "channel_change_at" if !value.is_empty() => {
                        config.channel_change_at =
                            parse_value(key, value).or(config.channel_change_at)
                    }
                    _ => {} // Ignore unknown keys
                }
            }
        }

        config
    }

    /// Serialize config to simple key=value format
    fn serialize(&self) -> String {
        let mut lines = vec![
            "# analogtv session".to_string(),
            format!("frames={}", self.frames),
            format!("fps={}", self.fps),
            format!("width={}", self.width),
            format!("height={}", self.height),
            format!("seed={}", self.seed),
            format!("threads={}", self.threads),
            format!("noise={}", self.noise),
            format!("multipath={}", self.multipath),
        ];
        if let Some(frame) = self.channel_change_at {
            lines.push(format!("channel_change_at={}", frame));
        }
        lines.join("\n")
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Option<T> {
    match value.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(key, value, "ignoring invalid config value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        assert_eq!(AppConfig::parse(""), AppConfig::default());
    }

    #[test]
    fn test_parse_values() {
        let content = "# Comment\nframes=10\nwidth=320\nheight = 240\nnoise=0.5\nchannel_change_at=4";
        let config = AppConfig::parse(content);
        assert_eq!(config.frames, 10);
        assert_eq!((config.width, config.height), (320, 240));
        assert_eq!(config.noise, 0.5);
        assert_eq!(config.channel_change_at, Some(4));
    }

    #[test]
    fn test_parse_invalid_keeps_default() {
        let config = AppConfig::parse("frames=lots\nfps=25\nunknown=1");
        assert_eq!(config.frames, AppConfig::default().frames);
        assert_eq!(config.fps, 25.0);
    }

    #[test]
    fn test_parse_channel_change_at() {
        assert_eq!(AppConfig::parse("channel_change_at=").channel_change_at, None);
        assert_eq!(AppConfig::parse("channel_change_at=soon").channel_change_at, None);
        assert_eq!(AppConfig::parse("channel_change_at=12").channel_change_at, Some(12));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = AppConfig {
            frames: 3,
            seed: 99,
            channel_change_at: Some(1),
            ..AppConfig::default()
        };
        assert_eq!(AppConfig::parse(&config.serialize()), config);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir()
            .join(format!("analogtv-test-{}", std::process::id()))
            .join("config.txt");
        let config = AppConfig {
            threads: 2,
            ..AppConfig::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_paths() {
        assert!(AppConfig::config_path().ends_with("analogtv/config.txt"));
        assert!(AppConfig::controls_path().ends_with("analogtv/controls.txt"));
    }
}

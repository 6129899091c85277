//! NTSC-derived frame geometry and signal levels.
//!
//! Every sample count is multiplied by [`SCALE`]; sync and colorburst
//! detection assume the same scale on both ends of the chain.

/// Uniform resolution multiplier applied to all timing constants.
pub const SCALE: usize = 1;

// --- Frame structure ---
pub const LINES: usize = 262 * SCALE;
pub const TOP: usize = 30 * SCALE;
pub const VISLINES: usize = 200 * SCALE;
pub const BOT: usize = TOP + VISLINES;

/// Samples per scanline (4x colorburst frequency).
pub const SAMPLES_PER_LINE: usize = 912 * SCALE;

// --- Horizontal timing (samples from start of line) ---
pub const SYNC_START: usize = 0;
pub const BP_START: usize = 4700 * SAMPLES_PER_LINE / 63500; // 67
pub const CB_START: usize = 5800 * SAMPLES_PER_LINE / 63500; // 83
pub const PIC_START: usize = 9400 * SAMPLES_PER_LINE / 63500; // 135
pub const PIC_LEN: usize = 52600 * SAMPLES_PER_LINE / 63500; // 755
pub const FP_START: usize = 62000 * SAMPLES_PER_LINE / 63500; // 890

/// Portion of the picture a typical set shows after overscan.
pub const VIS_START: usize = PIC_START + PIC_LEN / 8;
pub const VIS_END: usize = PIC_START + PIC_LEN * 7 / 8;
pub const VIS_LEN: usize = VIS_END - VIS_START;

/// Length of the colorburst in samples (9 cycles).
pub const CB_LEN: usize = 36 * SCALE;

/// Samples in one frame of composite signal.
pub const SIGNAL_LEN: usize = LINES * SAMPLES_PER_LINE;

pub const GHOST_TAPS: usize = 4;
pub const MAX_LINE_HEIGHT: usize = 12;

/// Size of the gamma lookup table.
pub const INTENSITY_LEVELS: usize = 1024;

/// Samples of noise-only signal after a channel switch.
pub const CHANNEL_CHANGE_CYCLES: usize = 200_000;

// --- IRE levels ---
pub const WHITE_LEVEL: i32 = 100;
pub const BLACK_LEVEL: i32 = 10;
pub const BLANK_LEVEL: i32 = 0;
pub const SYNC_LEVEL: i32 = -40;
pub const CB_LEVEL: i32 = 20;

/// Smallest output the receiver renders into.
pub const MIN_WIDTH: usize = 266;
pub const MIN_HEIGHT: usize = 200;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ntsc_offsets() {
        assert_eq!(BP_START, 67);
        assert_eq!(CB_START, 83);
        assert_eq!(PIC_START, 135);
        assert_eq!(PIC_LEN, 755);
        assert_eq!(FP_START, 890);
        assert_eq!(VIS_START, 229);
        assert_eq!(VIS_END, 795);
        assert_eq!(SIGNAL_LEN, 238_944);
    }

    #[test]
    fn test_signal_len_is_group_aligned() {
        assert_eq!(SIGNAL_LEN % 4, 0);
        assert_eq!(SAMPLES_PER_LINE % 4, 0);
    }
}

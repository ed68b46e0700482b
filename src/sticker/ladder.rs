//! Quality ladders: the degradation policy for the adaptive transcoder.
//!
//! Each ladder is walked top to bottom. The first preset is the best
//! looking and the largest, and every next one trades fidelity for bytes.

use super::StickerKind;
use std::time::Duration;

/// libwebp `compression_level` upper bound.
pub const MAX_COMPRESSION_EFFORT: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodingPreset {
    /// Lossy quality factor in `0..=100`.
    pub quality: u8,

    /// Output frames per second. Ignored for static stickers.
    pub frame_rate: u32,

    /// The input is cut to this length. Ignored for static stickers.
    pub max_duration: Duration,

    /// libwebp compression level in `0..=6`. Higher is slower, but smaller.
    pub compression_effort: u8,

    /// Drop frames that barely differ from the previous one.
    pub decimate_duplicate_frames: bool,
}

impl EncodingPreset {
    const fn animated(
        quality: u8,
        frame_rate: u32,
        max_duration_secs: u64,
        compression_effort: u8,
        decimate_duplicate_frames: bool,
    ) -> Self {
        Self {
            quality,
            frame_rate,
            max_duration: Duration::from_secs(max_duration_secs),
            compression_effort,
            decimate_duplicate_frames,
        }
    }

    const fn still(quality: u8, compression_effort: u8) -> Self {
        Self::animated(quality, 1, 1, compression_effort, false)
    }
}

pub const ANIMATED_LADDER: &[EncodingPreset] = &[
    EncodingPreset::animated(80, 15, 10, 4, false),
    EncodingPreset::animated(65, 15, 10, 5, false),
    EncodingPreset::animated(50, 12, 8, 6, true),
    EncodingPreset::animated(35, 10, 8, 6, true),
    EncodingPreset::animated(25, 10, 6, 6, true),
    EncodingPreset::animated(15, 8, 5, 6, true),
];

pub const STATIC_LADDER: &[EncodingPreset] = &[
    EncodingPreset::still(90, 4),
    EncodingPreset::still(75, 6),
    EncodingPreset::still(60, 6),
    EncodingPreset::still(40, 6),
    EncodingPreset::still(20, 6),
];

pub fn presets(kind: StickerKind) -> &'static [EncodingPreset] {
    match kind {
        StickerKind::Static => STATIC_LADDER,
        StickerKind::Animated => ANIMATED_LADDER,
    }
}

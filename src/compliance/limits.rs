//! Platform constraints for WhatsApp stickers. Callers branch on these
//! directly, so they are part of the public contract.

use crate::util::byte_size::KIB;
use std::time::Duration;

/// Every sticker must be exactly this many pixels wide and high.
pub const STICKER_DIMENSION: u32 = 512;

pub const MAX_STATIC_BYTES: usize = 100 * KIB;
pub const MAX_ANIMATED_BYTES: usize = 500 * KIB;

/// Size WhatsApp recommends for a sticker. Anything larger than
/// [`OVERSIZE_ADVISORY_FACTOR`] times this is reported as a warning.
pub const RECOMMENDED_BYTES: usize = 15 * KIB;
pub const OVERSIZE_ADVISORY_FACTOR: usize = 3;

pub const MAX_PACK_CHARS: usize = 128;
pub const MAX_AUTHOR_CHARS: usize = 128;
pub const MAX_ID_CHARS: usize = 128;

/// Fewer categories than this produce a warning, not an error.
pub const MIN_CATEGORIES: usize = 1;
pub const MAX_CATEGORIES: usize = 3;

pub const MAX_ANIMATION_DURATION: Duration = Duration::from_secs(10);
pub const MIN_FRAME_DURATION: Duration = Duration::from_millis(8);

/// Frame count past which an animation probably violates the duration
/// limits (15 fps for 10 seconds). Decoders don't report exact frame
/// timings, so this is only a heuristic.
pub const FRAME_COUNT_ADVISORY: usize = 150;

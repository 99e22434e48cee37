//! Wire-format limits.
//!
//! All framing limits are defined here for consistent enforcement.

/// Default ceiling on a single size-and-buffer frame (16 MiB).
///
/// Applied before allocation so a hostile length prefix cannot reserve
/// memory it never sends.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Length of a frame header in bytes (u32, little-endian).
pub const FRAME_HEADER_LEN: usize = 4;

/// Length of the notification creation timestamp in bytes (i64,
/// little-endian, Unix milliseconds).
pub const TIMESTAMP_LEN: usize = 8;

/// Configurable framing limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameLimits {
    /// Maximum bytes a single frame may declare.
    pub max_frame: usize,
}

impl Default for FrameLimits {
    fn default() -> Self {
        Self {
            max_frame: MAX_FRAME_LEN,
        }
    }
}

impl FrameLimits {
    /// Limits with a custom frame ceiling.
    pub fn with_max_frame(max_frame: usize) -> Self {
        Self { max_frame }
    }
}

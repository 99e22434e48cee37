//! Channel configuration.

use deaddrop_protocol::FrameLimits;

/// Configuration for a [`crate::Channel`].
///
/// # Example
///
/// ```
/// use deaddrop_core::ChannelConfig;
///
/// let config = ChannelConfig::default()
///     .with_max_frame(4 * 1024 * 1024)
///     .with_continue_on_invalid(true);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct ChannelConfig {
    /// Framing limits applied to every untrusted read.
    pub frame_limits: FrameLimits,

    /// Report per-item `Malformed`/`InvalidMessage` failures through the
    /// progress callback and keep going, instead of aborting the batch.
    ///
    /// Off by default: silently dropping corrupt items would hide
    /// attacks from the caller.
    pub continue_on_invalid: bool,
}

impl ChannelConfig {
    /// Set the size-and-buffer frame ceiling.
    pub fn with_max_frame(mut self, max_frame: usize) -> Self {
        self.frame_limits = FrameLimits::with_max_frame(max_frame);
        self
    }

    /// Opt in to skipping invalid inbox items instead of aborting.
    pub fn with_continue_on_invalid(mut self, continue_on_invalid: bool) -> Self {
        self.continue_on_invalid = continue_on_invalid;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deaddrop_protocol::MAX_FRAME_LEN;

    #[test]
    fn test_defaults() {
        let config = ChannelConfig::default();
        assert_eq!(config.frame_limits.max_frame, MAX_FRAME_LEN);
        assert!(!config.continue_on_invalid);
    }

    #[test]
    fn test_builders() {
        let config = ChannelConfig::default()
            .with_max_frame(1024)
            .with_continue_on_invalid(true);
        assert_eq!(config.frame_limits.max_frame, 1024);
        assert!(config.continue_on_invalid);
    }
}

//! Channel phase reporting.
//!
//! The step loop keeps plain flags; this is the derived view of them.

/// Where a channel is in its step cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelPhase {
    /// Not running.
    Idle,
    /// Running with steps left (or continuous), waiting for the next edge.
    Stepping,
    /// Last pulse is still high and must fall before completion.
    PulseFalling,
    /// No steps left, waiting for the link to be free to report completion.
    Completing,
}

impl ChannelPhase {
    /// Phase name for display/debugging.
    pub const fn name(self) -> &'static str {
        match self {
            ChannelPhase::Idle => "Idle",
            ChannelPhase::Stepping => "Stepping",
            ChannelPhase::PulseFalling => "PulseFalling",
            ChannelPhase::Completing => "Completing",
        }
    }

    /// Whether the channel is producing or finishing pulses.
    #[inline]
    pub const fn is_active(self) -> bool {
        !matches!(self, ChannelPhase::Idle)
    }
}

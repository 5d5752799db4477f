//! Wall-clock access and the lead times used to schedule synchronized starts.

use std::time::{SystemTime, UNIX_EPOCH};

/// Lead for resuming or seeking while playing; clients already have the track loaded.
pub const RESUME_LEAD_SECS: f64 = 0.3;
/// Lead for auto-play after a track change; clients must load the new track first.
pub const TRACK_CHANGE_LEAD_SECS: f64 = 0.5;
/// Manual resync anchor, deliberately placed in the past.
pub const CATCH_UP_LEAD_SECS: f64 = -0.3;

/// Source of wall-clock time, in seconds since the Unix epoch.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> f64;
}

/// [`Clock`] backed by the operating system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs_f64())
            .unwrap_or_default()
    }
}

/// Why a timed playback message is being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lead {
    /// `play`, or `seek` while playing.
    Resume,
    /// `next` / `previous` / shuffle pick.
    TrackChange,
    /// Manually requested `sync`.
    CatchUp,
}

impl Lead {
    /// Offset added to "now", in seconds.
    pub fn seconds(self) -> f64 {
        match self {
            Lead::Resume => RESUME_LEAD_SECS,
            Lead::TrackChange => TRACK_CHANGE_LEAD_SECS,
            Lead::CatchUp => CATCH_UP_LEAD_SECS,
        }
    }

    /// Target wall-clock timestamp for a message computed at `now`.
    pub fn target(self, now: f64) -> f64 {
        now + self.seconds()
    }
}

#[cfg(test)]
pub use self::manual::ManualClock;

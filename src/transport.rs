//! Audio transport control.
//!
//! The editor never decodes audio. It only drives a transport and asks it
//! where the playhead is. [`PlaybackClock`] is a transport without any audio,
//! advanced by the host with [`gametime::TimeStamp`]s, which is enough to run
//! the editor headless.

use gametime::{TimeSpan, TimeStamp};
use num::ToPrimitive;

/// The operations the editor consumes from an audio player.
///
/// Positions and durations are whole milliseconds.
pub trait AudioTransport {
    /// Where the playhead is now.
    fn current_position_ms(&self) -> i64;
    /// Start playing from the current position.
    fn start(&mut self);
    /// Stop advancing, keeping the position.
    fn pause(&mut self);
    /// Continue playing after [`Self::pause`].
    fn resume(&mut self);
    /// Stop playing and rewind to the beginning.
    fn stop_and_reset(&mut self);
    /// Move the playhead.
    fn set_position_ms(&mut self, position_ms: i64);
    /// Length of the loaded audio, `0` when nothing is loaded.
    fn duration_ms(&self) -> i64;
}

/// A silent transport that measures elapsed time between host polls.
///
/// The clock only moves when [`PlaybackClock::step_to`] is called, so its
/// position is deterministic for a given sequence of time stamps.
#[derive(Clone, Copy)]
pub struct PlaybackClock {
    duration_ms: i64,
    last_poll_at: TimeStamp,
    started_at: Option<TimeStamp>,
    position_at_start_ms: i64,
}

impl PlaybackClock {
    /// Create a stopped clock at position zero.
    #[must_use]
    pub const fn new(duration_ms: i64, now: TimeStamp) -> Self {
        Self {
            duration_ms,
            last_poll_at: now,
            started_at: None,
            position_at_start_ms: 0,
        }
    }

    /// Advance the clock to `now`. Earlier time stamps are ignored.
    pub fn step_to(&mut self, now: TimeStamp) {
        if now > self.last_poll_at {
            self.last_poll_at = now;
        }
    }

    /// Replace the loaded track length. The position is clamped into it.
    pub fn set_duration_ms(&mut self, duration_ms: i64) {
        let position = self.current_position_ms();
        self.duration_ms = duration_ms.max(0);
        self.rebase(position);
    }

    /// Whether the clock is advancing.
    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.started_at.is_some()
    }

    fn rebase(&mut self, position_ms: i64) {
        self.position_at_start_ms = position_ms.clamp(0, self.duration_ms.max(0));
        if self.started_at.is_some() {
            self.started_at = Some(self.last_poll_at);
        }
    }
}

impl std::fmt::Debug for PlaybackClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackClock")
            .field("duration_ms", &self.duration_ms)
            .field("position_ms", &self.current_position_ms())
            .field("playing", &self.is_playing())
            .finish_non_exhaustive()
    }
}

impl AudioTransport for PlaybackClock {
    fn current_position_ms(&self) -> i64 {
        let Some(started) = self.started_at else {
            return self.position_at_start_ms;
        };
        let elapsed = self
            .last_poll_at
            .checked_elapsed_since(started)
            .unwrap_or(TimeSpan::ZERO);
        let elapsed_ms = (elapsed.as_secs_f64() * 1000.0)
            .floor()
            .to_i64()
            .unwrap_or(0);
        self.position_at_start_ms
            .saturating_add(elapsed_ms)
            .min(self.duration_ms)
    }

    fn start(&mut self) {
        self.started_at = Some(self.last_poll_at);
    }

    fn pause(&mut self) {
        self.position_at_start_ms = self.current_position_ms();
        self.started_at = None;
    }

    fn resume(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(self.last_poll_at);
        }
    }

    fn stop_and_reset(&mut self) {
        self.started_at = None;
        self.position_at_start_ms = 0;
    }

    fn set_position_ms(&mut self, position_ms: i64) {
        self.rebase(position_ms);
    }

    fn duration_ms(&self) -> i64 {
        self.duration_ms
    }
}

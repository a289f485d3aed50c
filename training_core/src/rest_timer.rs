//! One-second countdown used for rests and timed intervals.
//!
//! The timer owns no thread and schedules nothing. The host calls `tick()`
//! once per second and the timer reports what happened. Dropping the timer
//! (or the runner that owns it) is all the cancellation there is, so a block
//! that is left can never tick into the next one.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |
//!            v
//!         Finished          (skip() from any state -> Idle)
//! ```

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    /// Reached zero. No further ticks until restarted.
    Finished,
}

/// Result of one `tick()` on a running timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub remaining: u32,
    /// Play the audible cue for this second
    pub cue: bool,
    /// This tick reached zero
    pub finished: bool,
}

#[derive(Debug, Clone)]
pub struct RestTimer {
    duration: u32,
    remaining: u32,
    state: TimerState,
    cue_seconds: u32,
}

impl RestTimer {
    /// `cue_seconds` is how many final ticks (the one reaching zero included)
    /// carry the audible cue.
    pub fn new(cue_seconds: u32) -> Self {
        Self {
            duration: 0,
            remaining: 0,
            state: TimerState::Idle,
            cue_seconds,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// Running or paused: a countdown the user can still see
    pub fn is_active(&self) -> bool {
        matches!(self.state, TimerState::Running | TimerState::Paused)
    }

    pub fn is_finished(&self) -> bool {
        self.state == TimerState::Finished
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start counting down from `seconds`. A zero duration finishes at once
    /// without producing any tick.
    pub fn start(&mut self, seconds: u32) {
        self.duration = seconds;
        self.remaining = seconds;
        self.state = if seconds == 0 {
            TimerState::Finished
        } else {
            TimerState::Running
        };
        tracing::debug!("Timer started at {}s", seconds);
    }

    /// Advance one second. Returns `None` unless the timer is running.
    pub fn tick(&mut self) -> Option<Tick> {
        if self.state != TimerState::Running {
            return None;
        }

        self.remaining = self.remaining.saturating_sub(1);
        let finished = self.remaining == 0;
        if finished {
            self.state = TimerState::Finished;
        }

        Some(Tick {
            remaining: self.remaining,
            cue: self.remaining < self.cue_seconds,
            finished,
        })
    }

    pub fn pause(&mut self) -> bool {
        if self.state == TimerState::Running {
            self.state = TimerState::Paused;
            true
        } else {
            false
        }
    }

    pub fn resume(&mut self) -> bool {
        if self.state == TimerState::Paused {
            self.state = TimerState::Running;
            true
        } else {
            false
        }
    }

    /// Stop without completing the countdown.
    pub fn skip(&mut self) {
        if self.is_active() {
            tracing::debug!("Timer skipped with {}s left", self.remaining);
        }
        self.remaining = 0;
        self.state = TimerState::Idle;
    }

    /// Start again from the last started duration.
    pub fn restart(&mut self) {
        self.start(self.duration);
    }
}

/// Render seconds as `M:SS`.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

//! Countdown clock for a meditation session.
//!
//! The clock is a plain state machine advanced one second per [`SessionClock::tick`].
//! Driving it from a real timer is the job of [`crate::session::ActiveSession`].

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ClockStatus {
    #[default]
    Idle,
    Running,
    Stopped,
    Completed,
}

/// Result of advancing the clock by one second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    pub seconds_remaining: u32,
    /// Set on the tick that reaches zero, carrying the configured minutes
    pub completed: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClock {
    status: ClockStatus,
    total_seconds: u32,
    seconds_remaining: u32,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting down from `total_seconds`, restarting if already running
    pub fn start(&mut self, total_seconds: u32) {
        *self = Self {
            status: ClockStatus::Running,
            total_seconds,
            seconds_remaining: total_seconds,
        };
    }

    /// Advance one second
    ///
    /// Returns `None` when the clock is not running, so a stray tick after
    /// completion or stop can never report completion twice.
    pub fn tick(&mut self) -> Option<ClockTick> {
        if self.status != ClockStatus::Running {
            return None;
        }

        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        let completed = if self.seconds_remaining == 0 {
            self.status = ClockStatus::Completed;
            Some(self.total_seconds / 60)
        } else {
            None
        };

        Some(ClockTick {
            seconds_remaining: self.seconds_remaining,
            completed,
        })
    }

    /// Halt without reporting completion
    pub fn stop(&mut self) {
        if self.status == ClockStatus::Running {
            self.status = ClockStatus::Stopped;
        }
    }

    pub fn status(&self) -> ClockStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == ClockStatus::Running
    }

    pub fn is_completed(&self) -> bool {
        self.status == ClockStatus::Completed
    }

    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn seconds_elapsed(&self) -> u32 {
        self.total_seconds - self.seconds_remaining
    }

    /// Remaining time as `MM:SS`
    pub fn countdown_label(&self) -> String {
        format_countdown(self.seconds_remaining)
    }
}

/// Minutes credited for a session ended before the clock ran out
///
/// Whole elapsed minutes, but never less than one.
pub fn early_end_minutes(seconds_elapsed: u32) -> u32 {
    (seconds_elapsed / 60).max(1)
}

/// Format seconds as a zero-padded `MM:SS` countdown
pub fn format_countdown(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

//! Core domain types for the Zen meditation system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Breathing phases, steps and techniques
//! - Session configuration and outcomes
//! - The persisted progress record

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Shortest session a user may configure, in minutes
pub const MIN_SESSION_MINUTES: u32 = 1;

/// Longest session a user may configure, in minutes
pub const MAX_SESSION_MINUTES: u32 = 120;

// ============================================================================
// Breathing Types
// ============================================================================

/// Phase of a single breath
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BreathPhase {
    Inhale,
    Hold,
    Exhale,
    Rest,
}

/// One timed step of a breathing cycle
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BreathStep {
    pub phase: BreathPhase,
    pub duration_seconds: u32,
    pub label: String,
}

/// A named, repeating breathing pattern (e.g., "Box", 4-4-4-4)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BreathTechnique {
    pub id: String,
    pub name: String,
    pub description: String,
    pub steps: Vec<BreathStep>,
}

impl BreathTechnique {
    /// Length of one full cycle in seconds
    pub fn cycle_seconds(&self) -> u32 {
        self.steps.iter().map(|s| s.duration_seconds).sum()
    }
}

/// The built-in set of breathing techniques
#[derive(Clone, Debug)]
pub struct TechniqueCatalog {
    pub techniques: HashMap<String, BreathTechnique>,
    /// Display order, matching the order techniques were registered
    pub order: Vec<String>,
}

// ============================================================================
// Session Types
// ============================================================================

/// What the user chose when starting a session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    minutes: u32,
    technique_id: String,
}

impl SessionConfig {
    /// Build a session configuration, rejecting durations outside 1..=120 minutes
    pub fn new(minutes: u32, technique_id: impl Into<String>) -> crate::Result<Self> {
        if !(MIN_SESSION_MINUTES..=MAX_SESSION_MINUTES).contains(&minutes) {
            return Err(crate::Error::InvalidSession(format!(
                "duration must be between {} and {} minutes, got {}",
                MIN_SESSION_MINUTES, MAX_SESSION_MINUTES, minutes
            )));
        }

        Ok(Self {
            minutes,
            technique_id: technique_id.into(),
        })
    }

    /// Parse a user-entered duration (e.g., a custom minutes field)
    pub fn parse(minutes: &str, technique_id: impl Into<String>) -> crate::Result<Self> {
        let minutes = minutes.trim().parse::<u32>().map_err(|_| {
            crate::Error::InvalidSession(format!("duration is not a whole number: {:?}", minutes))
        })?;
        Self::new(minutes, technique_id)
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn total_seconds(&self) -> u32 {
        self.minutes * 60
    }

    pub fn technique_id(&self) -> &str {
        &self.technique_id
    }
}

/// How a session ended and how many minutes it earns
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SessionOutcome {
    pub minutes_credited: u32,
    pub completed: bool,
}

// ============================================================================
// Progress Types
// ============================================================================

/// The user's cumulative meditation progress (one per installation)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressRecord {
    pub total_minutes: u32,
    pub streak_days: u32,
    pub last_meditation_day: Option<NaiveDate>,
    pub garden_level: u8,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            total_minutes: 0,
            streak_days: 0,
            last_meditation_day: None,
            garden_level: 1,
        }
    }
}

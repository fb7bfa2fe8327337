//! Breathing guide animation state.
//!
//! Each step of a technique is split into 100 progress ticks, so the tick
//! period is one hundredth of the step's duration. The cycle loops for as
//! long as the cycler is active.

use crate::{BreathPhase, BreathStep, BreathTechnique, Error, Result};
use serde::Serialize;
use std::time::Duration;

/// Progress ticks per breath step
pub const TICKS_PER_STEP: u8 = 100;

/// Point-in-time view of the breathing guide
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BreathSnapshot {
    pub phase: BreathPhase,
    pub label: String,
    pub phase_index: usize,
    pub progress_percent: u8,
    pub scale: f32,
}

#[derive(Debug, Clone)]
pub struct BreathCycler {
    technique: BreathTechnique,
    active: bool,
    phase_index: usize,
    progress_percent: u8,
}

impl BreathCycler {
    /// Create an inactive cycler. The technique must have at least one step.
    pub fn new(technique: BreathTechnique) -> Result<Self> {
        validate_technique(&technique)?;
        Ok(Self {
            technique,
            active: false,
            phase_index: 0,
            progress_percent: 0,
        })
    }

    /// Start or stop cycling. Stopping rewinds to the first phase.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        if !active {
            self.rewind();
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Swap the technique. Only allowed while inactive.
    pub fn set_technique(&mut self, technique: BreathTechnique) -> Result<()> {
        if self.active {
            return Err(Error::InvalidSession(
                "cannot switch breathing technique during a session".into(),
            ));
        }
        validate_technique(&technique)?;
        self.technique = technique;
        self.rewind();
        Ok(())
    }

    pub fn technique(&self) -> &BreathTechnique {
        &self.technique
    }

    /// Advance progress by one tick, moving to the next phase after 100 ticks
    ///
    /// Returns `false` (and does nothing) when inactive.
    pub fn tick(&mut self) -> bool {
        if !self.active {
            return false;
        }

        self.progress_percent += 1;
        if self.progress_percent >= TICKS_PER_STEP {
            self.progress_percent = 0;
            self.phase_index = (self.phase_index + 1) % self.technique.steps.len();
        }
        true
    }

    /// How long to wait before the next tick, based on the current step
    pub fn tick_interval(&self) -> Duration {
        let step_ms = u64::from(self.current_step().duration_seconds) * 1000;
        Duration::from_millis(step_ms / u64::from(TICKS_PER_STEP))
    }

    pub fn current_step(&self) -> &BreathStep {
        &self.technique.steps[self.phase_index]
    }

    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    /// Size of the breathing circle relative to rest
    ///
    /// Inhale grows from 1.0 to 1.4, exhale shrinks back, holds stay full.
    pub fn breath_scale(&self) -> f32 {
        let fraction = f32::from(self.progress_percent) / 100.0;
        match self.current_step().phase {
            BreathPhase::Inhale => 1.0 + 0.4 * fraction,
            BreathPhase::Exhale => 1.4 - 0.4 * fraction,
            BreathPhase::Hold => 1.4,
            BreathPhase::Rest => 1.0,
        }
    }

    pub fn snapshot(&self) -> BreathSnapshot {
        let step = self.current_step();
        BreathSnapshot {
            phase: step.phase,
            label: step.label.clone(),
            phase_index: self.phase_index,
            progress_percent: self.progress_percent,
            scale: self.breath_scale(),
        }
    }

    fn rewind(&mut self) {
        self.phase_index = 0;
        self.progress_percent = 0;
    }
}

fn validate_technique(technique: &BreathTechnique) -> Result<()> {
    if technique.steps.is_empty() || technique.steps.iter().any(|s| s.duration_seconds == 0) {
        return Err(Error::CatalogValidation(format!(
            "technique '{}' needs at least one step and positive durations",
            technique.id
        )));
    }
    Ok(())
}

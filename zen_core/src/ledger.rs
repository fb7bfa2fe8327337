//! Cumulative meditation progress: minutes, streak, and garden level.
//!
//! Progress lives in a [`KeyValueStore`] under four keys. The garden level is
//! always recomputed from total minutes; the stored level is only a cache for
//! other readers.

use crate::store::KeyValueStore;
use crate::{Error, ProgressRecord, Result, SessionOutcome};
use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Highest garden level
pub const MAX_GARDEN_LEVEL: u8 = 10;

/// Minutes needed to reach each level, indexed by `level - 1`
pub const LEVEL_FLOORS: [u32; MAX_GARDEN_LEVEL as usize] =
    [0, 5, 15, 30, 60, 120, 180, 300, 480, 720];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Map total meditated minutes to a garden level in `1..=10`
pub fn garden_level(total_minutes: u32) -> u8 {
    // LEVEL_FLOORS[0] is 0, so at least one floor always matches
    LEVEL_FLOORS
        .iter()
        .filter(|&&floor| total_minutes >= floor)
        .count() as u8
}

/// Percentage of the way from `level` to the next one, or `None` at the top level
pub fn level_progress(level: u8, total_minutes: u32) -> Option<u8> {
    if level >= MAX_GARDEN_LEVEL {
        return None;
    }
    let level = level.max(1) as usize;
    let current = LEVEL_FLOORS[level - 1];
    let next = LEVEL_FLOORS[level];
    let span = u64::from(next - current);
    let gained = u64::from(total_minutes.saturating_sub(current));

    // Round half up
    let pct = (gained * 100 + span / 2) / span;
    Some(pct.min(100) as u8)
}

/// Short description of what the garden looks like at a level
pub fn level_label(level: u8) -> &'static str {
    match level {
        0 | 1 => "Bare soil",
        2 => "First sprouts",
        3 => "Young growth",
        4 => "Flowers forming",
        5 => "In bloom",
        6 => "Cherry blossoms",
        7 => "Tall trees",
        8 => "Dense forest",
        9 => "Zen forest",
        _ => "Eternal garden",
    }
}

/// Streak after meditating on `today`, given the previous streak and last day
///
/// A second session on the same day leaves the streak as is. A session on
/// the day after the last one extends it. Anything else starts over at 1.
pub fn next_streak(streak_days: u32, last_day: Option<NaiveDate>, today: NaiveDate) -> u32 {
    match last_day {
        Some(last) if last == today => streak_days,
        Some(last) if Some(last) == today.pred_opt() => streak_days.saturating_add(1),
        _ => 1,
    }
}

/// Which wall clock decides what "today" is for streaks
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DayBoundary {
    /// Days roll over at local midnight
    #[default]
    Local,
    /// Days roll over at UTC midnight
    Utc,
}

/// The current calendar day under the given boundary
pub fn today(boundary: DayBoundary) -> NaiveDate {
    match boundary {
        DayBoundary::Local => Local::now().date_naive(),
        DayBoundary::Utc => Utc::now().date_naive(),
    }
}

/// Storage keys used for progress
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageKeys {
    pub total_minutes: String,
    pub streak_days: String,
    pub last_meditation_day: String,
    pub garden_level: String,
}

impl StorageKeys {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            total_minutes: format!("{}_meditation_total", prefix),
            streak_days: format!("{}_meditation_streak", prefix),
            last_meditation_day: format!("{}_last_meditation_day", prefix),
            garden_level: format!("{}_garden_level", prefix),
        }
    }
}

/// Reads and updates the progress record held in a key-value store
pub struct ProgressLedger<S: KeyValueStore> {
    store: S,
    keys: StorageKeys,
}

impl<S: KeyValueStore> ProgressLedger<S> {
    pub fn new(store: S, key_prefix: &str) -> Self {
        Self {
            store,
            keys: StorageKeys::with_prefix(key_prefix),
        }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Read the current progress record
    ///
    /// Missing or malformed values fall back to defaults; a corrupted counter
    /// never blocks a session.
    pub fn load(&self) -> ProgressRecord {
        let total_minutes = self.read_counter(&self.keys.total_minutes).unwrap_or(0);
        let streak_days = self.read_counter(&self.keys.streak_days).unwrap_or(0);
        let last_meditation_day = self
            .read_raw(&self.keys.last_meditation_day)
            .and_then(|raw| match NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT) {
                Ok(date) => Some(date),
                Err(e) => {
                    tracing::warn!(
                        "Ignoring malformed last meditation day {:?}: {}",
                        raw,
                        e
                    );
                    None
                }
            });

        ProgressRecord {
            total_minutes,
            streak_days,
            last_meditation_day,
            garden_level: garden_level(total_minutes),
        }
    }

    /// Credit a session of `minutes` finished on `completion_date`
    ///
    /// Adds the minutes, updates the streak by calendar-day adjacency,
    /// records the day and recomputes the level. All four keys are written
    /// in one batch.
    pub fn apply_session(
        &mut self,
        minutes: u32,
        completion_date: NaiveDate,
    ) -> Result<ProgressRecord> {
        if minutes == 0 {
            return Err(Error::InvalidSession(
                "a session must credit at least one minute".into(),
            ));
        }

        let previous = self.load();
        let total_minutes = previous.total_minutes.saturating_add(minutes);
        let streak_days = next_streak(
            previous.streak_days,
            previous.last_meditation_day,
            completion_date,
        );

        let record = ProgressRecord {
            total_minutes,
            streak_days,
            last_meditation_day: Some(completion_date),
            garden_level: garden_level(total_minutes),
        };

        self.store.set_many(&[
            (self.keys.total_minutes.clone(), record.total_minutes.to_string()),
            (self.keys.garden_level.clone(), record.garden_level.to_string()),
            (self.keys.streak_days.clone(), record.streak_days.to_string()),
            (
                self.keys.last_meditation_day.clone(),
                completion_date.format(DATE_FORMAT).to_string(),
            ),
        ])?;

        if record.garden_level > previous.garden_level {
            tracing::info!(
                "Garden grew from level {} to {}",
                previous.garden_level,
                record.garden_level
            );
        }
        tracing::info!(
            "Credited {} minutes on {}: total {}, streak {}",
            minutes,
            completion_date,
            record.total_minutes,
            record.streak_days
        );

        Ok(record)
    }

    /// Credit a finished session
    pub fn apply_outcome(
        &mut self,
        outcome: &SessionOutcome,
        completion_date: NaiveDate,
    ) -> Result<ProgressRecord> {
        self.apply_session(outcome.minutes_credited, completion_date)
    }

    fn read_raw(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}. Using default.", key, e);
                None
            }
        }
    }

    fn read_counter(&self, key: &str) -> Option<u32> {
        let raw = self.read_raw(key)?;
        match raw.trim().parse::<u32>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring malformed counter {} = {:?}: {}", key, raw, e);
                None
            }
        }
    }
}

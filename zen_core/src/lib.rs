#![forbid(unsafe_code)]

//! Core domain model and business logic for the Zen meditation companion.
//!
//! This crate provides:
//! - Domain types (breathing techniques, session configuration, progress)
//! - The built-in technique catalog
//! - Session countdown and breathing guide state machines
//! - A scoped session handle that drives both timers
//! - Progress ledger (minutes, streak, garden level) over key-value storage
//! - Garden rendering

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod store;
pub mod clock;
pub mod breath;
pub mod ledger;
pub mod garden;
pub mod session;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{get_default_catalog, DEFAULT_TECHNIQUE_ID};
pub use config::Config;
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use clock::{early_end_minutes, SessionClock};
pub use breath::{BreathCycler, BreathSnapshot};
pub use ledger::{garden_level, level_label, level_progress, DayBoundary, ProgressLedger};
pub use garden::{render_garden, GardenCell};
pub use session::{ActiveSession, SessionEvent};

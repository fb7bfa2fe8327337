//! Built-in breathing techniques.
//!
//! This module provides the techniques offered when starting a session.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Technique used when none is configured
pub const DEFAULT_TECHNIQUE_ID: &str = "calm";

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<TechniqueCatalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static TechniqueCatalog {
    &DEFAULT_CATALOG
}

fn step(phase: BreathPhase, duration_seconds: u32, label: &str) -> BreathStep {
    BreathStep {
        phase,
        duration_seconds,
        label: label.into(),
    }
}

/// Builds the default catalog with the three built-in techniques
///
/// **Note**: Prefer `get_default_catalog()` which returns a cached reference.
pub fn build_default_catalog() -> TechniqueCatalog {
    let mut catalog = TechniqueCatalog {
        techniques: HashMap::new(),
        order: Vec::new(),
    };

    catalog.register(BreathTechnique {
        id: "calm".into(),
        name: "Calm".into(),
        description: "4-4-6-2 · Reduce anxiety".into(),
        steps: vec![
            step(BreathPhase::Inhale, 4, "Breathe in"),
            step(BreathPhase::Hold, 4, "Hold"),
            step(BreathPhase::Exhale, 6, "Breathe out"),
            step(BreathPhase::Rest, 2, "Rest"),
        ],
    });

    // The fourth box side is an empty-lung hold, animated like rest
    catalog.register(BreathTechnique {
        id: "box".into(),
        name: "Box".into(),
        description: "4-4-4-4 · Build focus".into(),
        steps: vec![
            step(BreathPhase::Inhale, 4, "Breathe in"),
            step(BreathPhase::Hold, 4, "Hold"),
            step(BreathPhase::Exhale, 4, "Breathe out"),
            step(BreathPhase::Rest, 4, "Hold"),
        ],
    });

    catalog.register(BreathTechnique {
        id: "478".into(),
        name: "4-7-8".into(),
        description: "4-7-8 · Deepen sleep".into(),
        steps: vec![
            step(BreathPhase::Inhale, 4, "Breathe in"),
            step(BreathPhase::Hold, 7, "Hold"),
            step(BreathPhase::Exhale, 8, "Breathe out"),
        ],
    });

    catalog
}

impl TechniqueCatalog {
    fn register(&mut self, technique: BreathTechnique) {
        self.order.push(technique.id.clone());
        self.techniques.insert(technique.id.clone(), technique);
    }

    /// Look up a technique by id
    pub fn get(&self, id: &str) -> Option<&BreathTechnique> {
        self.techniques.get(id)
    }

    /// Look up a technique by id, failing with a session error if unknown
    pub fn require(&self, id: &str) -> crate::Result<&BreathTechnique> {
        self.get(id).ok_or_else(|| {
            crate::Error::InvalidSession(format!(
                "unknown breathing technique '{}' (available: {})",
                id,
                self.order.join(", ")
            ))
        })
    }

    /// Techniques in display order
    pub fn iter(&self) -> impl Iterator<Item = &BreathTechnique> {
        self.order.iter().filter_map(move |id| self.techniques.get(id))
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors (empty if valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.techniques.is_empty() {
            errors.push("Catalog has no techniques".into());
        }

        for (id, technique) in &self.techniques {
            if id != &technique.id {
                errors.push(format!(
                    "Technique registered as '{}' has id '{}'",
                    id, technique.id
                ));
            }

            if technique.steps.is_empty() {
                errors.push(format!("Technique '{}' has no steps", id));
            }

            for (idx, step) in technique.steps.iter().enumerate() {
                if step.duration_seconds == 0 {
                    errors.push(format!(
                        "Technique '{}' step {} has zero duration",
                        id, idx
                    ));
                }
            }
        }

        for id in &self.order {
            if !self.techniques.contains_key(id) {
                errors.push(format!("Ordered technique '{}' is not registered", id));
            }
        }

        errors
    }
}

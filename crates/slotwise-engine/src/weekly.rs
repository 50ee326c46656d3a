//! Recurring weekly open-hours rules, one window per provider+weekday.
//!
//! Rules are edited independently of any calendar date. Deleting a rule
//! removes all future slot candidates for that weekday until a new one is
//! created; it does not retroactively affect already-booked appointments.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{NaiveTime, Weekday};

use crate::error::{EngineError, Result};
use crate::types::{ProviderId, TimeRange};

/// In-memory weekly availability registry. Thread-safe via internal `RwLock`.
///
/// The map key enforces the "at most one window per provider+weekday"
/// invariant structurally; `create` additionally rejects duplicates so a
/// second rule for the same day is an explicit error rather than a silent
/// replacement.
#[derive(Debug, Default)]
pub struct WeeklyAvailabilityRegistry {
    rules: RwLock<HashMap<(ProviderId, Weekday), TimeRange>>,
}

impl WeeklyAvailabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a rule. Rejects `start >= end` and a pre-existing rule for the
    /// same provider+weekday.
    pub fn create(
        &self,
        provider: ProviderId,
        weekday: Weekday,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<()> {
        let window = TimeRange::new(start, end)?;
        let mut rules = self.rules.write().unwrap();
        if rules.contains_key(&(provider, weekday)) {
            return Err(EngineError::Validation(format!(
                "provider {} already has a rule for {}",
                provider, weekday
            )));
        }
        rules.insert((provider, weekday), window);
        Ok(())
    }

    /// Replace the rule for a provider+weekday. Rejects `start >= end`;
    /// fails with `NotFound` when no rule exists to update.
    pub fn update(
        &self,
        provider: ProviderId,
        weekday: Weekday,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<()> {
        let window = TimeRange::new(start, end)?;
        let mut rules = self.rules.write().unwrap();
        match rules.get_mut(&(provider, weekday)) {
            Some(existing) => {
                *existing = window;
                Ok(())
            }
            None => Err(EngineError::NotFound(format!(
                "weekly rule for provider {} on {}",
                provider, weekday
            ))),
        }
    }

    /// Remove the rule for a provider+weekday. Returns whether one existed.
    pub fn remove(&self, provider: ProviderId, weekday: Weekday) -> bool {
        self.rules
            .write()
            .unwrap()
            .remove(&(provider, weekday))
            .is_some()
    }

    /// The open window for a provider on a weekday, if any.
    pub fn rule(&self, provider: ProviderId, weekday: Weekday) -> Option<TimeRange> {
        self.rules.read().unwrap().get(&(provider, weekday)).copied()
    }
}

//! Date-specific schedule exceptions, per provider or global.
//!
//! An exception matches a provider when its own provider id is absent
//! (applies to every provider) or equal to the queried provider. An
//! `Unavailable` exception with no time bounds closes the whole day; with
//! bounds it removes only that sub-window from availability and the rest of
//! the day's weekly-rule window stays open.
//!
//! `AvailableOverride` exceptions are accepted and stored, but slot
//! generation does not consult them — widening availability beyond the
//! weekly rule is an extension point, not part of the core algorithm.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::types::{ProviderId, TimeRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExceptionKind {
    /// Blocks the whole day (no bounds) or a sub-window (with bounds).
    Unavailable,
    /// Stored but inert: does not widen availability in the core algorithm.
    AvailableOverride,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleException {
    pub id: u64,
    /// `None` means the exception applies to every provider.
    pub provider: Option<ProviderId>,
    pub date: NaiveDate,
    pub kind: ExceptionKind,
    /// `None` means the whole day.
    pub window: Option<TimeRange>,
    pub reason: Option<String>,
}

impl ScheduleException {
    /// Whether this exception applies to the queried provider.
    pub fn matches(&self, provider: ProviderId) -> bool {
        self.provider.is_none() || self.provider == Some(provider)
    }

    /// Whether this exception closes the provider's whole day.
    pub fn closes_whole_day(&self, provider: ProviderId) -> bool {
        self.kind == ExceptionKind::Unavailable && self.window.is_none() && self.matches(provider)
    }
}

/// In-memory exception registry. Thread-safe via internal `RwLock`.
#[derive(Debug)]
pub struct ExceptionRegistry {
    by_date: RwLock<HashMap<NaiveDate, Vec<ScheduleException>>>,
    next_id: AtomicU64,
}

impl Default for ExceptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExceptionRegistry {
    pub fn new() -> Self {
        Self {
            by_date: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Add an exception and return its id.
    ///
    /// Bounds must be given both-or-neither; bounded exceptions reject
    /// `start >= end`.
    pub fn add(
        &self,
        provider: Option<ProviderId>,
        date: NaiveDate,
        kind: ExceptionKind,
        bounds: Option<(NaiveTime, NaiveTime)>,
        reason: Option<String>,
    ) -> Result<u64> {
        let window = match bounds {
            Some((start, end)) => Some(TimeRange::new(start, end)?),
            None => None,
        };
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let exception = ScheduleException {
            id,
            provider,
            date,
            kind,
            window,
            reason,
        };
        self.by_date
            .write()
            .unwrap()
            .entry(date)
            .or_default()
            .push(exception);
        Ok(id)
    }

    /// Remove an exception by id. Fails with `NotFound` for unknown ids.
    pub fn remove(&self, id: u64) -> Result<()> {
        let mut by_date = self.by_date.write().unwrap();
        for exceptions in by_date.values_mut() {
            if let Some(pos) = exceptions.iter().position(|e| e.id == id) {
                exceptions.remove(pos);
                return Ok(());
            }
        }
        Err(EngineError::NotFound(format!("schedule exception {}", id)))
    }

    /// All exceptions matching a provider on a date, in creation order.
    pub fn list_for(&self, provider: ProviderId, date: NaiveDate) -> Vec<ScheduleException> {
        let by_date = self.by_date.read().unwrap();
        let mut matching: Vec<ScheduleException> = by_date
            .get(&date)
            .map(|exceptions| {
                exceptions
                    .iter()
                    .filter(|e| e.matches(provider))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        matching.sort_by_key(|e| e.id);
        matching
    }

    /// Whether a matching unbounded `Unavailable` exception closes the day.
    pub fn day_closed(&self, provider: ProviderId, date: NaiveDate) -> bool {
        self.by_date
            .read()
            .unwrap()
            .get(&date)
            .is_some_and(|exceptions| exceptions.iter().any(|e| e.closes_whole_day(provider)))
    }

    /// The bounded `Unavailable` windows matching a provider on a date.
    pub fn blocked_windows(&self, provider: ProviderId, date: NaiveDate) -> Vec<TimeRange> {
        self.by_date
            .read()
            .unwrap()
            .get(&date)
            .map(|exceptions| {
                exceptions
                    .iter()
                    .filter(|e| e.kind == ExceptionKind::Unavailable && e.matches(provider))
                    .filter_map(|e| e.window)
                    .collect()
            })
            .unwrap_or_default()
    }
}

//! Core domain types shared across the engine.
//!
//! All interval comparisons use the half-open `[start, end)` convention:
//! a window ending at 10:00 does not overlap a window starting at 10:00.

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Identifier of a service-performing provider.
pub type ProviderId = u64;
/// Identifier of a booking client.
pub type ClientId = u64;
/// Identifier of an appointment in the ledger.
pub type AppointmentId = u64;
/// Identifier of an offered service (affects appointment duration only).
pub type ServiceId = u64;

/// Granularity of listed candidate slots, in minutes.
pub const SLOT_MINUTES: i64 = 30;

/// Appointment duration when no services are selected, in minutes.
pub const DEFAULT_APPOINTMENT_MINUTES: i64 = 60;

/// A half-open `[start, end)` time window within a single day.
///
/// Used for weekly-rule windows, bounded exception windows, appointment
/// intervals, and listed slots. Construction enforces `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    /// Create a range, rejecting `start >= end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if start >= end {
            return Err(EngineError::Validation(format!(
                "end time {} must be after start time {}",
                end.format("%H:%M"),
                start.format("%H:%M")
            )));
        }
        Ok(Self { start, end })
    }

    /// The single overlap test used everywhere conflict truth is needed.
    ///
    /// Two half-open intervals overlap iff `a.start < b.end && b.start < a.end`.
    /// Adjacent ranges (one ends exactly when the other starts) do NOT overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether `other` lies fully inside this range.
    pub fn contains(&self, other: &TimeRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// Duration of an appointment given the selected services' durations.
///
/// The sum of the selected services' minutes, or [`DEFAULT_APPOINTMENT_MINUTES`]
/// when no services are selected.
pub fn appointment_duration(service_minutes: &[i64]) -> Duration {
    if service_minutes.is_empty() {
        Duration::minutes(DEFAULT_APPOINTMENT_MINUTES)
    } else {
        Duration::minutes(service_minutes.iter().sum())
    }
}

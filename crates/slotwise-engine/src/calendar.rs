//! Day-level availability flags for calendar rendering.
//!
//! A day is flagged open iff a weekly rule exists for its weekday AND no
//! matching unbounded `Unavailable` exception exists for the date. The
//! appointment ledger is deliberately not consulted: this is a coarse, cheap
//! signal for painting a month grid, not a promise of bookable time. Callers
//! needing the authoritative answer use `BookingEngine::list_free_slots` or
//! `is_slot_free` — a flagged-open day may legitimately have zero free slots
//! once bookings are accounted for.

use chrono::{Datelike, NaiveDate};

use crate::error::{EngineError, Result};
use crate::exceptions::ExceptionRegistry;
use crate::types::ProviderId;
use crate::weekly::WeeklyAvailabilityRegistry;

/// Whether the provider's day has any open window at all.
pub fn day_has_open_window(
    weekly: &WeeklyAvailabilityRegistry,
    exceptions: &ExceptionRegistry,
    provider: ProviderId,
    date: NaiveDate,
) -> bool {
    weekly.rule(provider, date.weekday()).is_some() && !exceptions.day_closed(provider, date)
}

/// The flagged-open days of one calendar month, ascending.
pub fn open_days(
    weekly: &WeeklyAvailabilityRegistry,
    exceptions: &ExceptionRegistry,
    provider: ProviderId,
    year: i32,
    month: u32,
) -> Result<Vec<NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| EngineError::Validation(format!("invalid month {}-{:02}", year, month)))?;

    let mut days = Vec::new();
    let mut date = first;
    while date.month() == month {
        if day_has_open_window(weekly, exceptions, provider, date) {
            days.push(date);
        }
        match date.succ_opt() {
            Some(next) => date = next,
            None => break,
        }
    }
    Ok(days)
}

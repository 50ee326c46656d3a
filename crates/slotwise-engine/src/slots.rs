//! Slot computation — the single shared availability algorithm.
//!
//! Every caller that needs bookable time goes through this module; no UI or
//! collaborator re-derives overlap logic on its own. Listing enumerates
//! fixed 30-minute candidates; validation checks an arbitrary `[start, end)`
//! window (the real requested service duration) against the same
//! weekly-rule/exception/ledger resolution; booking re-validates under the
//! ledger's per-day lock so a stale listing can never double-book.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};

use crate::calendar;
use crate::error::{EngineError, Result};
use crate::exceptions::ExceptionRegistry;
use crate::ledger::{Appointment, AppointmentLedger};
use crate::providers::ProviderDirectory;
use crate::types::{
    appointment_duration, ClientId, ProviderId, ServiceId, TimeRange, SLOT_MINUTES,
};
use crate::weekly::WeeklyAvailabilityRegistry;

/// A booking request for the commit path. The requested duration is derived
/// from the selected services' minutes (id, minutes pairs), defaulting to 60
/// minutes when none are selected.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub provider: ProviderId,
    pub client: ClientId,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub services: Vec<(ServiceId, i64)>,
}

/// The engine facade composing the provider directory, the two rule
/// registries, and the appointment ledger.
///
/// All operations take `&self`; the components synchronize internally, so an
/// engine shared across threads supports concurrent reads and race-safe
/// commits with no caller-side locking.
#[derive(Debug, Default)]
pub struct BookingEngine {
    pub providers: ProviderDirectory,
    pub weekly: WeeklyAvailabilityRegistry,
    pub exceptions: ExceptionRegistry,
    pub ledger: AppointmentLedger,
}

impl BookingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// List the free 30-minute slots for a provider on a date, ascending.
    ///
    /// No weekly rule, a matching full-day exception, or an inactive
    /// provider all yield an empty list — a closed day is a normal result,
    /// not an error. Unknown provider ids are `NotFound`.
    pub fn list_free_slots(
        &self,
        provider: ProviderId,
        date: NaiveDate,
    ) -> Result<Vec<TimeRange>> {
        let record = self.providers.require(provider)?;
        if !record.active {
            return Ok(Vec::new());
        }
        let Some(window) = self.weekly.rule(provider, date.weekday()) else {
            return Ok(Vec::new());
        };
        if self.exceptions.day_closed(provider, date) {
            return Ok(Vec::new());
        }

        let blocked = self.exceptions.blocked_windows(provider, date);
        let busy = self.ledger.blocking(provider, date);
        let step = Duration::minutes(SLOT_MINUTES);

        let mut slots = Vec::new();
        let mut cursor = window.start;
        loop {
            let (slot_end, wrapped) = cursor.overflowing_add_signed(step);
            if wrapped != 0 || slot_end > window.end {
                break;
            }
            let candidate = TimeRange {
                start: cursor,
                end: slot_end,
            };
            let clear = !blocked.iter().any(|b| b.overlaps(&candidate))
                && !busy.iter().any(|a| a.range.overlaps(&candidate));
            if clear {
                slots.push(candidate);
            }
            cursor = slot_end;
        }
        Ok(slots)
    }

    /// Duration-aware validation of an arbitrary `[start, end)` window.
    ///
    /// Unlike listing, this checks the real requested duration: the window
    /// must lie fully inside the weekly-rule window and overlap no bounded
    /// `Unavailable` exception and no non-cancelled appointment. A window
    /// running past the rule's end is not free even if its nominal 30-minute
    /// start looked free in the listing.
    pub fn is_slot_free(
        &self,
        provider: ProviderId,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<bool> {
        let record = self.providers.require(provider)?;
        let requested = TimeRange::new(start, end)?;
        if !record.active {
            return Ok(false);
        }
        Ok(self.window_is_open(provider, date, &requested))
    }

    /// Commit a booking. Runs the same resolution as [`is_slot_free`](Self::is_slot_free)
    /// and then the final race-safe overlap check inside the ledger, under
    /// the per-(provider, date) lock. The losing side of a race receives
    /// `Conflict` and must re-select; there is no internal retry.
    pub fn book(&self, request: BookingRequest) -> Result<Appointment> {
        let record = self.providers.require(request.provider)?;
        if !record.active {
            return Err(EngineError::Validation(format!(
                "provider {} is not accepting bookings",
                request.provider
            )));
        }
        if request.services.iter().any(|(_, minutes)| *minutes <= 0) {
            return Err(EngineError::Validation(
                "service durations must be positive".to_string(),
            ));
        }

        let minutes: Vec<i64> = request.services.iter().map(|(_, m)| *m).collect();
        let (end, wrapped) = request
            .start
            .overflowing_add_signed(appointment_duration(&minutes));
        if wrapped != 0 {
            return Err(EngineError::Validation(format!(
                "appointment starting at {} would run past midnight",
                request.start.format("%H:%M")
            )));
        }
        let range = TimeRange::new(request.start, end)?;

        // Open-hours and exception screening. A listing gone stale since the
        // caller fetched it surfaces here or in the ledger check below.
        if !self.window_is_open_ignoring_ledger(request.provider, request.date, &range) {
            return Err(EngineError::Conflict(format!(
                "window {} is outside provider {}'s bookable hours on {}",
                range, request.provider, request.date
            )));
        }

        let services: Vec<ServiceId> = request.services.iter().map(|(id, _)| *id).collect();
        self.ledger.commit(
            request.provider,
            request.client,
            request.date,
            range,
            services,
        )
    }

    /// Day-level openness flag, delegated to the calendar index. Coarse by
    /// design: it ignores the ledger, so a flagged-open day may still have
    /// zero free slots.
    pub fn day_has_open_window(&self, provider: ProviderId, date: NaiveDate) -> Result<bool> {
        let record = self.providers.require(provider)?;
        if !record.active {
            return Ok(false);
        }
        Ok(calendar::day_has_open_window(
            &self.weekly,
            &self.exceptions,
            provider,
            date,
        ))
    }

    /// The open days of one month for a provider, for calendar rendering.
    pub fn open_days(&self, provider: ProviderId, year: i32, month: u32) -> Result<Vec<NaiveDate>> {
        let record = self.providers.require(provider)?;
        if !record.active {
            return Ok(Vec::new());
        }
        calendar::open_days(&self.weekly, &self.exceptions, provider, year, month)
    }

    fn window_is_open(&self, provider: ProviderId, date: NaiveDate, requested: &TimeRange) -> bool {
        self.window_is_open_ignoring_ledger(provider, date, requested)
            && !self
                .ledger
                .blocking(provider, date)
                .iter()
                .any(|a| a.range.overlaps(requested))
    }

    fn window_is_open_ignoring_ledger(
        &self,
        provider: ProviderId,
        date: NaiveDate,
        requested: &TimeRange,
    ) -> bool {
        let Some(window) = self.weekly.rule(provider, date.weekday()) else {
            return false;
        };
        if !window.contains(requested) {
            return false;
        }
        if self.exceptions.day_closed(provider, date) {
            return false;
        }
        !self
            .exceptions
            .blocked_windows(provider, date)
            .iter()
            .any(|b| b.overlaps(requested))
    }
}

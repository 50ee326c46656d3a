//! Appointment ledger — the single authority for conflict truth.
//!
//! No other component re-derives a busy/free notion from appointments; they
//! ask the ledger. Appointments live in per-(provider, date) day cells, each
//! behind its own mutex, so committing a booking is serialized per provider
//! per date and never blocks another provider's (or another day's) commits.
//!
//! Status machine: `Pending → Confirmed → Completed` is linear; `Pending` or
//! `Confirmed` may go to `Cancelled` at any time; `Cancelled` and `Completed`
//! are terminal. Only the transition *into* `Cancelled` matters to
//! availability — it is the sole way a blocking appointment stops counting.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::types::{AppointmentId, ClientId, ProviderId, ServiceId, TimeRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    /// Whether an appointment in this status counts against availability.
    /// `Pending`, `Confirmed` and `Completed` block equally.
    pub fn blocks(&self) -> bool {
        *self != AppointmentStatus::Cancelled
    }

    /// Whether the status machine permits `self → next`.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (*self, next),
            (Pending, Confirmed) | (Confirmed, Completed) | (Pending | Confirmed, Cancelled)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub provider: ProviderId,
    pub client: ClientId,
    pub date: NaiveDate,
    pub range: TimeRange,
    pub status: AppointmentStatus,
    /// Selected services; these affect duration only.
    pub services: Vec<ServiceId>,
}

type DayKey = (ProviderId, NaiveDate);
type DayCell = Arc<Mutex<Vec<Appointment>>>;

/// In-memory appointment ledger. Reads clone out of the day cell; writes for
/// one provider+date serialize on that day's mutex only.
#[derive(Debug)]
pub struct AppointmentLedger {
    days: RwLock<HashMap<DayKey, DayCell>>,
    index: RwLock<HashMap<AppointmentId, DayKey>>,
    next_id: AtomicU64,
}

impl Default for AppointmentLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl AppointmentLedger {
    pub fn new() -> Self {
        Self {
            days: RwLock::new(HashMap::new()),
            index: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn day_cell(&self, key: DayKey) -> DayCell {
        if let Some(cell) = self.days.read().unwrap().get(&key) {
            return Arc::clone(cell);
        }
        let mut days = self.days.write().unwrap();
        Arc::clone(days.entry(key).or_default())
    }

    /// All appointments for a provider on a date, sorted by start time.
    /// Includes cancelled ones; use [`blocking`](Self::blocking) to exclude them.
    pub fn appointments(&self, provider: ProviderId, date: NaiveDate) -> Vec<Appointment> {
        let cell = self.day_cell((provider, date));
        let mut appointments = cell.lock().unwrap().clone();
        appointments.sort_by_key(|a| a.range.start);
        appointments
    }

    /// The non-cancelled appointments for a provider on a date, sorted by
    /// start time. These are the intervals that count against availability.
    pub fn blocking(&self, provider: ProviderId, date: NaiveDate) -> Vec<Appointment> {
        let mut appointments = self.appointments(provider, date);
        appointments.retain(|a| a.status.blocks());
        appointments
    }

    pub fn get(&self, id: AppointmentId) -> Option<Appointment> {
        let key = *self.index.read().unwrap().get(&id)?;
        let cell = self.day_cell(key);
        let appointments = cell.lock().unwrap();
        appointments.iter().find(|a| a.id == id).cloned()
    }

    /// Commit a new `Pending` appointment, enforcing the exclusivity
    /// invariant: under the day's mutex, the requested range is re-checked
    /// against every blocking appointment before insertion. Exactly one of
    /// two concurrent requests for overlapping windows can succeed; the
    /// loser receives `Conflict`.
    pub fn commit(
        &self,
        provider: ProviderId,
        client: ClientId,
        date: NaiveDate,
        range: TimeRange,
        services: Vec<ServiceId>,
    ) -> Result<Appointment> {
        let key = (provider, date);
        let cell = self.day_cell(key);
        let mut appointments = cell.lock().unwrap();

        if let Some(taken) = appointments
            .iter()
            .find(|a| a.status.blocks() && a.range.overlaps(&range))
        {
            return Err(EngineError::Conflict(format!(
                "window {} overlaps appointment {} ({})",
                range, taken.id, taken.range
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let appointment = Appointment {
            id,
            provider,
            client,
            date,
            range,
            status: AppointmentStatus::Pending,
            services,
        };
        appointments.push(appointment.clone());
        self.index.write().unwrap().insert(id, key);
        Ok(appointment)
    }

    /// Insert an appointment with a caller-chosen id and status, e.g. when
    /// loading a persisted schedule document. Blocking appointments are
    /// still conflict-checked; cancelled ones are admitted as-is.
    pub fn restore(&self, appointment: Appointment) -> Result<()> {
        let key = (appointment.provider, appointment.date);
        let cell = self.day_cell(key);
        let mut appointments = cell.lock().unwrap();

        if appointment.status.blocks() {
            if let Some(taken) = appointments
                .iter()
                .find(|a| a.status.blocks() && a.range.overlaps(&appointment.range))
            {
                return Err(EngineError::Conflict(format!(
                    "appointment {} ({}) overlaps appointment {} ({})",
                    appointment.id, appointment.range, taken.id, taken.range
                )));
            }
        }

        self.next_id.fetch_max(appointment.id + 1, Ordering::Relaxed);
        self.index.write().unwrap().insert(appointment.id, key);
        appointments.push(appointment);
        Ok(())
    }

    /// `Pending → Confirmed`.
    pub fn confirm(&self, id: AppointmentId) -> Result<()> {
        self.transition(id, AppointmentStatus::Confirmed)
    }

    /// `Confirmed → Completed`.
    pub fn complete(&self, id: AppointmentId) -> Result<()> {
        self.transition(id, AppointmentStatus::Completed)
    }

    /// Cancel an appointment, freeing its window. Cancelling an
    /// already-cancelled appointment is a no-op, never an error — the same
    /// slot is never freed twice.
    pub fn cancel(&self, id: AppointmentId) -> Result<()> {
        self.transition(id, AppointmentStatus::Cancelled)
    }

    fn transition(&self, id: AppointmentId, next: AppointmentStatus) -> Result<()> {
        let key = *self
            .index
            .read()
            .unwrap()
            .get(&id)
            .ok_or_else(|| EngineError::NotFound(format!("appointment {}", id)))?;
        let cell = self.day_cell(key);
        let mut appointments = cell.lock().unwrap();
        let appointment = appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("appointment {}", id)))?;

        // Idempotent cancel.
        if next == AppointmentStatus::Cancelled && appointment.status == AppointmentStatus::Cancelled
        {
            return Ok(());
        }
        if !appointment.status.can_transition_to(next) {
            return Err(EngineError::Validation(format!(
                "appointment {} cannot move from {:?} to {:?}",
                id, appointment.status, next
            )));
        }
        appointment.status = next;
        Ok(())
    }
}

//! # slotwise-engine
//!
//! Availability and conflict engine for single-resource booking calendars.
//!
//! Three independent, mutable sources of truth combine into one answer:
//! a recurring weekly open-hours rule per provider, date-specific schedule
//! exceptions (full-day or partial blocks), and the ledger of existing
//! non-cancelled appointments. The engine answers both *listing* questions
//! ("which 30-minute slots are bookable on this day?") and *commit* questions
//! ("may this exact window be booked right now?"), and guarantees that two
//! concurrent bookings can never claim overlapping windows.
//!
//! ## Modules
//!
//! - [`providers`] — provider directory (identity + active flag)
//! - [`weekly`] — recurring per-weekday open window per provider
//! - [`exceptions`] — date-specific overrides, provider-scoped or global
//! - [`ledger`] — appointment store; the single authority for conflict truth
//! - [`slots`] — slot listing, duration-aware validation, and booking commit
//! - [`calendar`] — cheap day-level openness flags for calendar rendering
//! - [`error`] — error types

pub mod calendar;
pub mod error;
pub mod exceptions;
pub mod ledger;
pub mod providers;
pub mod slots;
pub mod types;
pub mod weekly;

pub use error::{EngineError, Result};
pub use exceptions::{ExceptionKind, ExceptionRegistry, ScheduleException};
pub use ledger::{Appointment, AppointmentLedger, AppointmentStatus};
pub use providers::{Provider, ProviderDirectory};
pub use slots::{BookingEngine, BookingRequest};
pub use types::{appointment_duration, TimeRange, SLOT_MINUTES};
pub use weekly::WeeklyAvailabilityRegistry;

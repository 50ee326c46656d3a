//! Tests for the appointment ledger: conflict truth, the status machine,
//! and race-safe commits.

use std::sync::Arc;
use std::thread;

use chrono::{NaiveDate, NaiveTime, Weekday};
use slotwise_engine::{
    Appointment, AppointmentLedger, AppointmentStatus, BookingEngine, BookingRequest, EngineError,
    TimeRange,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn t(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()
}

fn range(start: NaiveTime, end: NaiveTime) -> TimeRange {
    TimeRange::new(start, end).unwrap()
}

// ── Commit and conflict truth ───────────────────────────────────────────────

#[test]
fn overlapping_commit_is_rejected() {
    let ledger = AppointmentLedger::new();
    ledger
        .commit(1, 500, monday(), range(t(10, 0), t(11, 0)), vec![])
        .unwrap();

    let result = ledger.commit(1, 501, monday(), range(t(10, 30), t(11, 30)), vec![]);

    assert!(matches!(result, Err(EngineError::Conflict(_))));
    assert_eq!(ledger.blocking(1, monday()).len(), 1);
}

#[test]
fn adjacent_commits_both_succeed() {
    let ledger = AppointmentLedger::new();
    ledger
        .commit(1, 500, monday(), range(t(10, 0), t(11, 0)), vec![])
        .unwrap();

    // Half-open intervals: ending at 11:00 does not block starting at 11:00.
    ledger
        .commit(1, 501, monday(), range(t(11, 0), t(12, 0)), vec![])
        .unwrap();

    assert_eq!(ledger.blocking(1, monday()).len(), 2);
}

#[test]
fn cancelled_appointment_does_not_block_commit() {
    let ledger = AppointmentLedger::new();
    let first = ledger
        .commit(1, 500, monday(), range(t(10, 0), t(11, 0)), vec![])
        .unwrap();
    ledger.cancel(first.id).unwrap();

    ledger
        .commit(1, 501, monday(), range(t(10, 0), t(11, 0)), vec![])
        .unwrap();

    assert_eq!(ledger.appointments(1, monday()).len(), 2);
    assert_eq!(ledger.blocking(1, monday()).len(), 1);
}

#[test]
fn other_providers_and_dates_do_not_conflict() {
    let ledger = AppointmentLedger::new();
    let tuesday = NaiveDate::from_ymd_opt(2026, 3, 17).unwrap();
    let window = range(t(10, 0), t(11, 0));

    ledger.commit(1, 500, monday(), window, vec![]).unwrap();
    ledger.commit(2, 501, monday(), window, vec![]).unwrap();
    ledger.commit(1, 502, tuesday, window, vec![]).unwrap();

    assert_eq!(ledger.blocking(1, monday()).len(), 1);
    assert_eq!(ledger.blocking(2, monday()).len(), 1);
    assert_eq!(ledger.blocking(1, tuesday).len(), 1);
}

#[test]
fn restore_admits_cancelled_overlaps_but_checks_blocking_ones() {
    let ledger = AppointmentLedger::new();
    ledger
        .commit(1, 500, monday(), range(t(10, 0), t(11, 0)), vec![])
        .unwrap();

    // A cancelled record from a persisted document may overlap freely.
    ledger
        .restore(Appointment {
            id: 90,
            provider: 1,
            client: 501,
            date: monday(),
            range: range(t(10, 0), t(11, 0)),
            status: AppointmentStatus::Cancelled,
            services: vec![],
        })
        .unwrap();

    // A blocking record may not.
    let result = ledger.restore(Appointment {
        id: 91,
        provider: 1,
        client: 502,
        date: monday(),
        range: range(t(10, 30), t(11, 30)),
        status: AppointmentStatus::Confirmed,
        services: vec![],
    });
    assert!(matches!(result, Err(EngineError::Conflict(_))));
}

// ── Status machine ──────────────────────────────────────────────────────────

#[test]
fn pending_confirmed_completed_is_the_happy_path() {
    let ledger = AppointmentLedger::new();
    let appointment = ledger
        .commit(1, 500, monday(), range(t(10, 0), t(11, 0)), vec![])
        .unwrap();
    assert_eq!(appointment.status, AppointmentStatus::Pending);

    ledger.confirm(appointment.id).unwrap();
    ledger.complete(appointment.id).unwrap();

    assert_eq!(
        ledger.get(appointment.id).unwrap().status,
        AppointmentStatus::Completed
    );
}

#[test]
fn completed_appointment_cannot_be_cancelled() {
    let ledger = AppointmentLedger::new();
    let appointment = ledger
        .commit(1, 500, monday(), range(t(10, 0), t(11, 0)), vec![])
        .unwrap();
    ledger.confirm(appointment.id).unwrap();
    ledger.complete(appointment.id).unwrap();

    assert!(matches!(
        ledger.cancel(appointment.id),
        Err(EngineError::Validation(_))
    ));
    // Completed still counts against availability.
    assert_eq!(ledger.blocking(1, monday()).len(), 1);
}

#[test]
fn double_cancel_is_a_no_op() {
    let ledger = AppointmentLedger::new();
    let appointment = ledger
        .commit(1, 500, monday(), range(t(10, 0), t(11, 0)), vec![])
        .unwrap();

    ledger.cancel(appointment.id).unwrap();
    ledger.cancel(appointment.id).unwrap();

    assert_eq!(
        ledger.get(appointment.id).unwrap().status,
        AppointmentStatus::Cancelled
    );
    assert!(ledger.blocking(1, monday()).is_empty());
}

#[test]
fn transition_on_unknown_id_is_not_found() {
    let ledger = AppointmentLedger::new();
    assert!(matches!(ledger.cancel(999), Err(EngineError::NotFound(_))));
    assert!(matches!(ledger.confirm(999), Err(EngineError::NotFound(_))));
}

// ── Concurrency ─────────────────────────────────────────────────────────────

#[test]
fn concurrent_commits_for_one_window_admit_exactly_one() {
    let engine = Arc::new(BookingEngine::new());
    let provider = engine.providers.register("Dana");
    engine
        .weekly
        .create(provider, Weekday::Mon, t(9, 0), t(13, 0))
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|client| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                engine.book(BookingRequest {
                    provider,
                    client,
                    date: monday(),
                    start: t(9, 0),
                    services: vec![(1, 30)],
                })
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(EngineError::Conflict(_))))
        .count();

    assert_eq!(successes, 1, "exactly one commit may win the race");
    assert_eq!(conflicts, 7, "every loser receives Conflict");
    assert_eq!(engine.ledger.blocking(provider, monday()).len(), 1);
}

#[test]
fn concurrent_commits_for_disjoint_windows_all_succeed() {
    let engine = Arc::new(BookingEngine::new());
    let provider = engine.providers.register("Dana");
    engine
        .weekly
        .create(provider, Weekday::Mon, t(9, 0), t(13, 0))
        .unwrap();

    let handles: Vec<_> = (0..4u32)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                engine.book(BookingRequest {
                    provider,
                    client: u64::from(i),
                    date: monday(),
                    start: t(9 + i, 0),
                    services: vec![(1, 30)],
                })
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }
    assert_eq!(engine.ledger.blocking(provider, monday()).len(), 4);
}

#[test]
fn concurrent_commit_and_cancel_keep_intervals_disjoint() {
    // Hammer one day with overlapping book attempts and cancels; the
    // non-cancelled intervals must stay pairwise disjoint throughout.
    let engine = Arc::new(BookingEngine::new());
    let provider = engine.providers.register("Dana");
    engine
        .weekly
        .create(provider, Weekday::Mon, t(9, 0), t(13, 0))
        .unwrap();

    let handles: Vec<_> = (0..6u64)
        .map(|client| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for offset in 0..8u32 {
                    let start = t(9 + offset / 2, (offset % 2) * 30);
                    if let Ok(appointment) = engine.book(BookingRequest {
                        provider,
                        client,
                        date: monday(),
                        start,
                        services: vec![(1, 30)],
                    }) {
                        // Free roughly half the wins again.
                        if client % 2 == 0 {
                            engine.ledger.cancel(appointment.id).unwrap();
                        }
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let blocking = engine.ledger.blocking(provider, monday());
    for (i, a) in blocking.iter().enumerate() {
        for b in &blocking[i + 1..] {
            assert!(
                !a.range.overlaps(&b.range),
                "blocking appointments {} and {} overlap",
                a.id,
                b.id
            );
        }
    }
}

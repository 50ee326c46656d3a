//! `slotwise` CLI — query availability and book appointments against a JSON
//! schedule document.
//!
//! ## Usage
//!
//! ```sh
//! # List the free 30-minute slots for provider 1 on a date
//! slotwise slots -i schedule.json -p 1 -d 2026-03-16
//!
//! # Validate an exact window (real service duration)
//! slotwise check -i schedule.json -p 1 -d 2026-03-16 --start 10:00 --end 11:15
//!
//! # List the open days of a month (calendar rendering flags)
//! slotwise month -i schedule.json -p 1 -m 2026-03
//!
//! # Attempt a booking; duration comes from the selected services
//! slotwise book -i schedule.json -p 1 -c 500 -d 2026-03-16 --start 10:30 -s 2 -s 3
//!
//! # The document may also arrive on stdin
//! cat schedule.json | slotwise slots -p 1 -d 2026-03-16
//! ```

use std::collections::HashMap;
use std::io::{self, Read};

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveTime, Weekday};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use slotwise_engine::{
    Appointment, AppointmentStatus, BookingEngine, BookingRequest, ExceptionKind, TimeRange,
};

#[derive(Parser)]
#[command(
    name = "slotwise",
    version,
    about = "Booking availability queries over a JSON schedule document"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the free 30-minute slots for a provider on a date
    Slots {
        /// Schedule document (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Provider id
        #[arg(short, long)]
        provider: u64,
        /// Date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,
    },
    /// Check whether an exact [start, end) window is free
    Check {
        /// Schedule document (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Provider id
        #[arg(short, long)]
        provider: u64,
        /// Date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,
        /// Window start (HH:MM)
        #[arg(long)]
        start: String,
        /// Window end (HH:MM)
        #[arg(long)]
        end: String,
    },
    /// List the open days of a month for a provider
    Month {
        /// Schedule document (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Provider id
        #[arg(short, long)]
        provider: u64,
        /// Month (YYYY-MM)
        #[arg(short, long)]
        month: String,
    },
    /// Book an appointment; prints the committed appointment as JSON
    Book {
        /// Schedule document (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Provider id
        #[arg(short, long)]
        provider: u64,
        /// Client id
        #[arg(short, long)]
        client: u64,
        /// Date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,
        /// Appointment start (HH:MM)
        #[arg(long)]
        start: String,
        /// Selected service ids (repeatable); duration defaults to 60
        /// minutes when none are given
        #[arg(short, long = "service")]
        services: Vec<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Slots {
            input,
            provider,
            date,
        } => {
            let (engine, _) = load_engine(input.as_deref())?;
            let date = parse_date(&date)?;
            let slots = engine.list_free_slots(provider, date)?;
            if slots.is_empty() {
                println!("no free slots");
            } else {
                for slot in slots {
                    println!("{}", slot);
                }
            }
        }
        Commands::Check {
            input,
            provider,
            date,
            start,
            end,
        } => {
            let (engine, _) = load_engine(input.as_deref())?;
            let date = parse_date(&date)?;
            let start = parse_time(&start)?;
            let end = parse_time(&end)?;
            if engine.is_slot_free(provider, date, start, end)? {
                println!("free");
            } else {
                println!("unavailable");
            }
        }
        Commands::Month {
            input,
            provider,
            month,
        } => {
            let (engine, _) = load_engine(input.as_deref())?;
            let (year, month) = parse_month(&month)?;
            for day in engine.open_days(provider, year, month)? {
                println!("{}", day);
            }
        }
        Commands::Book {
            input,
            provider,
            client,
            date,
            start,
            services,
        } => {
            let (engine, catalog) = load_engine(input.as_deref())?;
            let date = parse_date(&date)?;
            let start = parse_time(&start)?;
            let services = services
                .into_iter()
                .map(|id| {
                    catalog
                        .get(&id)
                        .map(|minutes| (id, *minutes))
                        .with_context(|| format!("unknown service id {}", id))
                })
                .collect::<Result<Vec<_>>>()?;

            let appointment = engine.book(BookingRequest {
                provider,
                client,
                date,
                start,
                services,
            })?;
            println!("{}", serde_json::to_string_pretty(&appointment)?);
        }
    }

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Schedule document
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ScheduleDoc {
    providers: Vec<ProviderDoc>,
    #[serde(default)]
    weekly_rules: Vec<RuleDoc>,
    #[serde(default)]
    exceptions: Vec<ExceptionDoc>,
    #[serde(default)]
    appointments: Vec<AppointmentDoc>,
    #[serde(default)]
    services: Vec<ServiceDoc>,
}

#[derive(Deserialize)]
struct ProviderDoc {
    id: u64,
    name: String,
    #[serde(default = "default_true")]
    active: bool,
}

#[derive(Deserialize)]
struct RuleDoc {
    provider: u64,
    weekday: String,
    start: String,
    end: String,
}

#[derive(Deserialize)]
struct ExceptionDoc {
    #[serde(default)]
    provider: Option<u64>,
    date: String,
    kind: String,
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    end: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Deserialize)]
struct AppointmentDoc {
    id: u64,
    provider: u64,
    client: u64,
    date: String,
    start: String,
    end: String,
    status: String,
    #[serde(default)]
    services: Vec<u64>,
}

#[derive(Deserialize)]
struct ServiceDoc {
    id: u64,
    #[allow(dead_code)]
    name: String,
    minutes: i64,
}

fn default_true() -> bool {
    true
}

/// Read the schedule document from a file or stdin and build the engine.
/// Returns the engine plus the service catalog (id → minutes).
fn load_engine(input: Option<&str>) -> Result<(BookingEngine, HashMap<u64, i64>)> {
    let json = read_input(input)?;
    let doc: ScheduleDoc =
        serde_json::from_str(&json).context("failed to parse schedule document")?;

    let engine = BookingEngine::new();

    for provider in doc.providers {
        engine.providers.insert(slotwise_engine::Provider {
            id: provider.id,
            name: provider.name,
            active: provider.active,
        });
    }

    for rule in doc.weekly_rules {
        engine
            .weekly
            .create(
                rule.provider,
                parse_weekday(&rule.weekday)?,
                parse_time(&rule.start)?,
                parse_time(&rule.end)?,
            )
            .with_context(|| format!("invalid weekly rule for provider {}", rule.provider))?;
    }

    for exception in doc.exceptions {
        let bounds = match (&exception.start, &exception.end) {
            (Some(start), Some(end)) => Some((parse_time(start)?, parse_time(end)?)),
            (None, None) => None,
            _ => bail!(
                "exception on {} must give both start and end, or neither",
                exception.date
            ),
        };
        engine
            .exceptions
            .add(
                exception.provider,
                parse_date(&exception.date)?,
                parse_exception_kind(&exception.kind)?,
                bounds,
                exception.reason,
            )
            .with_context(|| format!("invalid exception on {}", exception.date))?;
    }

    for appointment in doc.appointments {
        let range = TimeRange::new(parse_time(&appointment.start)?, parse_time(&appointment.end)?)
            .with_context(|| format!("invalid window for appointment {}", appointment.id))?;
        engine
            .ledger
            .restore(Appointment {
                id: appointment.id,
                provider: appointment.provider,
                client: appointment.client,
                date: parse_date(&appointment.date)?,
                range,
                status: parse_status(&appointment.status)?,
                services: appointment.services,
            })
            .with_context(|| format!("could not load appointment {}", appointment.id))?;
    }

    let catalog = doc
        .services
        .into_iter()
        .map(|service| (service.id, service.minutes))
        .collect();

    Ok((engine, catalog))
}

// ─────────────────────────────────────────────────────────────────────────────
// Input and parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Read input from a file path, or from stdin when no path is given.
fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read input file: {}", path)),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date (expected YYYY-MM-DD): {}", s))
}

fn parse_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .with_context(|| format!("invalid time (expected HH:MM): {}", s))
}

fn parse_month(s: &str) -> Result<(i32, u32)> {
    let (year, month) = s
        .split_once('-')
        .with_context(|| format!("invalid month (expected YYYY-MM): {}", s))?;
    Ok((
        year.parse()
            .with_context(|| format!("invalid year in month: {}", s))?,
        month
            .parse()
            .with_context(|| format!("invalid month number in: {}", s))?,
    ))
}

fn parse_weekday(s: &str) -> Result<Weekday> {
    s.parse::<Weekday>()
        .map_err(|_| anyhow::anyhow!("invalid weekday: {}", s))
}

fn parse_exception_kind(s: &str) -> Result<ExceptionKind> {
    match s.to_ascii_uppercase().as_str() {
        "UNAVAILABLE" => Ok(ExceptionKind::Unavailable),
        "AVAILABLE_OVERRIDE" | "AVAILABLEOVERRIDE" => Ok(ExceptionKind::AvailableOverride),
        _ => bail!("invalid exception kind: {}", s),
    }
}

fn parse_status(s: &str) -> Result<AppointmentStatus> {
    match s.to_ascii_uppercase().as_str() {
        "PENDING" => Ok(AppointmentStatus::Pending),
        "CONFIRMED" => Ok(AppointmentStatus::Confirmed),
        "CANCELLED" => Ok(AppointmentStatus::Cancelled),
        "COMPLETED" => Ok(AppointmentStatus::Completed),
        _ => bail!("invalid appointment status: {}", s),
    }
}

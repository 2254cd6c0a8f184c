use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use tracing::debug;

use shared_database::{AppointmentRepository, ProfileRepository, RepositoryError};
use shared_models::appointment::{Appointment, TimeSlot, SLOT_MINUTES};
use shared_models::clinic::WorkingHours;

use crate::models::AvailabilityError;

// ==============================================================================
// DAY & TIME PARSING
// ==============================================================================

/// Canonical three-letter key for a day name, case-insensitive. Unknown input
/// is returned untouched so it never matches a real weekday.
pub fn normalize_day(input: &str) -> String {
    let key = match input.to_lowercase().as_str() {
        "monday" | "mon" => "Mon",
        "tuesday" | "tue" | "tues" => "Tue",
        "wednesday" | "wed" => "Wed",
        "thursday" | "thu" | "thur" | "thurs" => "Thu",
        "friday" | "fri" => "Fri",
        "saturday" | "sat" => "Sat",
        "sunday" | "sun" => "Sun",
        _ => return input.to_string(),
    };
    key.to_string()
}

pub fn weekday_key(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

pub fn is_known_day(input: &str) -> bool {
    matches!(
        normalize_day(input).as_str(),
        "Mon" | "Tue" | "Wed" | "Thu" | "Fri" | "Sat" | "Sun"
    )
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

/// `[00:00, 24:00)` of `date` in UTC, the reference zone for every calendar computation.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    (start, start + Duration::days(1))
}

/// Absolute bounds of every well-formed window that applies to `date`.
/// Windows that fail to parse or have `end <= start` are skipped.
pub fn day_windows(hours: &[WorkingHours], date: NaiveDate) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let day = weekday_key(date.weekday());

    hours
        .iter()
        .filter(|window| normalize_day(&window.day_of_week) == day)
        .filter_map(|window| {
            let (Some(start), Some(end)) = (
                parse_time_of_day(&window.start),
                parse_time_of_day(&window.end),
            ) else {
                debug!(
                    "Skipping unparseable window {} {}-{}",
                    window.day_of_week, window.start, window.end
                );
                return None;
            };
            if end <= start {
                debug!("Skipping empty window {} {}-{}", window.day_of_week, window.start, window.end);
                return None;
            }
            Some((
                Utc.from_utc_datetime(&date.and_time(start)),
                Utc.from_utc_datetime(&date.and_time(end)),
            ))
        })
        .collect()
}

// ==============================================================================
// SLOT CALCULATION
// ==============================================================================

/// Fixed-width slots for `date`, each marked unavailable when it overlaps a
/// non-cancelled appointment. Slots never cross a window boundary; overlapping
/// windows are not merged.
pub fn compute_slots(
    hours: &[WorkingHours],
    date: NaiveDate,
    appointments: &[Appointment],
) -> Vec<TimeSlot> {
    let busy: Vec<(DateTime<Utc>, DateTime<Utc>)> = appointments
        .iter()
        .filter(|appointment| appointment.occupies_calendar())
        .map(|appointment| (appointment.appointment_date, appointment.scheduled_end_time()))
        .collect();

    let step = Duration::minutes(SLOT_MINUTES);
    let mut slots = Vec::new();

    for (window_start, window_end) in day_windows(hours, date) {
        let mut start = window_start;
        while start + step <= window_end {
            let end = start + step;
            let available = !busy
                .iter()
                .any(|(busy_start, busy_end)| start < *busy_end && *busy_start < end);

            slots.push(TimeSlot {
                start_time: start,
                end_time: end,
                available,
            });
            start = end;
        }
    }

    slots
}

/// Whether `requested_start` is exactly the start of an available slot.
pub fn is_bookable(slots: &[TimeSlot], requested_start: DateTime<Utc>) -> bool {
    slots
        .iter()
        .any(|slot| slot.available && slot.start_time == requested_start)
}

// ==============================================================================
// REPOSITORY-BACKED SERVICE
// ==============================================================================

pub struct AvailabilityService<'a, R: ?Sized> {
    repo: &'a R,
}

impl<'a, R> AvailabilityService<'a, R>
where
    R: ProfileRepository + AppointmentRepository + ?Sized,
{
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }

    /// Slots of the veterinarian's calendar for `date`.
    pub async fn compute_slots(
        &self,
        veterinarian_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>, AvailabilityError> {
        self.compute_slots_excluding(veterinarian_id, date, None).await
    }

    /// Same as `compute_slots`, ignoring the appointment `exclude_id`. Used
    /// when an existing appointment is being moved.
    pub async fn compute_slots_excluding(
        &self,
        veterinarian_id: &str,
        date: NaiveDate,
        exclude_id: Option<&str>,
    ) -> Result<Vec<TimeSlot>, AvailabilityError> {
        let vet = self
            .repo
            .get_veterinarian(veterinarian_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound(_) => AvailabilityError::VeterinarianNotFound,
                other => AvailabilityError::Repository(other),
            })?;

        let (day_start, day_end) = day_bounds(date);
        let appointments: Vec<Appointment> = self
            .repo
            .list_veterinarian_appointments_between(veterinarian_id, day_start, day_end)
            .await?
            .into_iter()
            .filter(|appointment| Some(appointment.id.as_str()) != exclude_id)
            .collect();

        let slots = compute_slots(&vet.available_hours, date, &appointments);
        debug!(
            "Computed {} slots for veterinarian {} on {}",
            slots.len(),
            veterinarian_id,
            date
        );
        Ok(slots)
    }
}

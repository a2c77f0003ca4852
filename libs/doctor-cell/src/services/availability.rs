//! Weekly schedule evaluation. Everything here is pure and works on the
//! clinic's local wall clock; callers convert instants before asking.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike};

use crate::models::{DoctorError, WeeklyAvailabilityBlock};

/// Parses a zero-padded 24h `HH:MM` into minutes since midnight.
pub fn parse_clock_time(value: &str) -> Option<u32> {
    let (hours, minutes) = value.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    if !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    (hours < 24 && minutes < 60).then_some(hours * 60 + minutes)
}

pub fn format_clock_time(minute_of_day: u32) -> String {
    format!("{:02}:{:02}", minute_of_day / 60, minute_of_day % 60)
}

/// 0 = Sunday .. 6 = Saturday, matching `WeeklyAvailabilityBlock::day_of_week`.
pub fn day_of_week(date: NaiveDate) -> i32 {
    date.weekday().num_days_from_sunday() as i32
}

fn minute_of_day(at: NaiveDateTime) -> u32 {
    at.hour() * 60 + at.minute()
}

/// A partial minute still occupies that minute, so window ends round up.
fn end_minute_of_day(at: NaiveDateTime) -> u32 {
    let minute = minute_of_day(at);
    if at.second() > 0 || at.nanosecond() > 0 {
        minute + 1
    } else {
        minute
    }
}

/// `[start, end]` of a well formed block in minutes since midnight.
fn block_window(block: &WeeklyAvailabilityBlock) -> Option<(u32, u32)> {
    if !(0..=6).contains(&block.day_of_week) {
        return None;
    }
    let start = parse_clock_time(&block.start_time)?;
    let end = parse_clock_time(&block.end_time)?;
    (end > start).then_some((start, end))
}

fn windows_for_day(
    schedule: &[WeeklyAvailabilityBlock],
    day: i32,
) -> impl Iterator<Item = (u32, u32)> + '_ {
    schedule
        .iter()
        .filter(move |block| block.day_of_week == day)
        .filter_map(block_window)
}

/// True iff `[start, start + duration)` lies inside one working block on
/// `start`'s weekday. Both block bounds are inclusive.
///
/// A window that ends on a later calendar day is never inside a block.
pub fn is_within_schedule(
    schedule: &[WeeklyAvailabilityBlock],
    start: NaiveDateTime,
    duration_minutes: i64,
) -> bool {
    if duration_minutes <= 0 {
        return false;
    }
    let Some(end) = TimeDelta::try_minutes(duration_minutes)
        .and_then(|duration| start.checked_add_signed(duration))
    else {
        return false;
    };
    if end.date() != start.date() {
        return false;
    }

    let (start_minute, end_minute) = (minute_of_day(start), end_minute_of_day(end));
    windows_for_day(schedule, day_of_week(start.date()))
        .any(|(block_start, block_end)| block_start <= start_minute && end_minute <= block_end)
}

/// Candidate start minutes for `date`: every `increment` from each block's
/// start while the whole window still fits. Sorted and deduplicated.
pub fn slot_starts_for_day(
    schedule: &[WeeklyAvailabilityBlock],
    date: NaiveDate,
    duration_minutes: u32,
    increment_minutes: u32,
) -> Vec<u32> {
    if duration_minutes == 0 || increment_minutes == 0 {
        return Vec::new();
    }

    let mut starts = BTreeSet::new();
    for (block_start, block_end) in windows_for_day(schedule, day_of_week(date)) {
        let mut candidate = block_start;
        while candidate + duration_minutes <= block_end {
            starts.insert(candidate);
            candidate += increment_minutes;
        }
    }

    starts.into_iter().collect()
}

/// Write-time checks for a replacement schedule: valid weekday, `HH:MM`
/// bounds, `end > start`, and no overlapping blocks on the same day.
/// Touching blocks (09:00-12:00, 12:00-15:00) are allowed.
pub fn validate_schedule(schedule: &[WeeklyAvailabilityBlock]) -> Result<(), DoctorError> {
    let mut by_day: BTreeMap<i32, Vec<(u32, u32)>> = BTreeMap::new();

    for block in schedule {
        if !(0..=6).contains(&block.day_of_week) {
            return Err(DoctorError::InvalidSchedule(format!(
                "dayOfWeek {} must be between 0 (Sunday) and 6 (Saturday)",
                block.day_of_week
            )));
        }
        let start = parse_clock_time(&block.start_time).ok_or_else(|| {
            DoctorError::InvalidSchedule(format!("startTime {:?} is not HH:MM", block.start_time))
        })?;
        let end = parse_clock_time(&block.end_time).ok_or_else(|| {
            DoctorError::InvalidSchedule(format!("endTime {:?} is not HH:MM", block.end_time))
        })?;
        if end <= start {
            return Err(DoctorError::InvalidSchedule(format!(
                "endTime {} must be after startTime {}",
                block.end_time, block.start_time
            )));
        }
        by_day.entry(block.day_of_week).or_default().push((start, end));
    }

    for (day, spans) in by_day.iter_mut() {
        spans.sort_unstable();
        if let Some(pair) = spans.windows(2).find(|pair| pair[1].0 < pair[0].1) {
            return Err(DoctorError::InvalidSchedule(format!(
                "blocks {}-{} and {}-{} overlap on day {}",
                format_clock_time(pair[0].0),
                format_clock_time(pair[0].1),
                format_clock_time(pair[1].0),
                format_clock_time(pair[1].1),
                day
            )));
        }
    }

    Ok(())
}

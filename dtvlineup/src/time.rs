//! Wall-clock access and time arithmetic helpers
//!
//! The engine never reads the system clock directly: grid alignment and the
//! night-block composer take a [`Clock`], so tests can pin "now" and the
//! local/UTC offset.

use crate::error::{Error, Result};
use chrono::{
    DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveTime, Offset, TimeZone, Timelike, Utc,
};

/// Milliseconds in one minute
pub const MS_PER_MINUTE: u64 = 60 * 1000;

/// Milliseconds in one hour
pub const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;

/// Milliseconds in one day
pub const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;

/// Source of "now" and of the local timezone offset
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;

    /// Offset of local time relative to UTC
    fn local_offset(&self) -> FixedOffset;

    /// Current local time
    fn now_local(&self) -> DateTime<FixedOffset> {
        self.now_utc().with_timezone(&self.local_offset())
    }
}

/// Clock backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_offset(&self) -> FixedOffset {
        *Local::now().offset()
    }
}

/// Clock frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
    offset: FixedOffset,
}

impl FixedClock {
    /// Frozen clock in a UTC local zone
    pub fn utc(now: DateTime<Utc>) -> Self {
        Self {
            now,
            offset: Utc.fix(),
        }
    }

    /// Frozen clock with an explicit local offset
    pub fn with_offset(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self { now, offset }
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.now
    }

    fn local_offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Converts a local wall-clock date/time to UTC using a fixed offset
pub fn local_to_utc(date: NaiveDate, hour: u32, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN) + Duration::hours(i64::from(hour));
    let utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
    Utc.from_utc_datetime(&utc)
}

/// Rejects an hour of day outside `[0, 23]`
pub(crate) fn check_hour(name: &'static str, value: u32) -> Result<()> {
    if value > 23 {
        return Err(Error::InvalidHour { name, value });
    }
    Ok(())
}

/// Hours from `start_hour` to the next `end_hour`, both already in `[0, 23]`
pub(crate) fn hours_between(start_hour: u32, end_hour: u32) -> u32 {
    (24 + end_hour - start_hour) % 24
}

/// Milliseconds from `start_hour:00` to the next `end_hour:00`
///
/// Wraps past midnight when `end_hour < start_hour`; equal hours give zero.
pub fn milliseconds_between_hours(start_hour: u32, end_hour: u32) -> Result<u64> {
    check_hour("start_hour", start_hour)?;
    check_hour("end_hour", end_hour)?;
    Ok(u64::from(hours_between(start_hour, end_hour)) * MS_PER_HOUR)
}

/// Milliseconds between midnight and a `HH:MM` or `HH:MM:SS` time of day
pub fn milliseconds_past_midnight(time: &str) -> Result<u64> {
    let parts = time.split(':').count();
    let parsed = match parts {
        2 => NaiveTime::parse_from_str(time, "%H:%M"),
        3 => NaiveTime::parse_from_str(time, "%H:%M:%S"),
        _ => return Err(Error::InvalidTimeString(time.to_string())),
    }
    .map_err(|_| Error::InvalidTimeString(time.to_string()))?;

    Ok(u64::from(parsed.num_seconds_from_midnight()) * 1000)
}

/// Formats a duration as `HH:MM:SS.m`
///
/// The millisecond part is printed without zero padding: 1005 ms gives
/// `00:00:01.5`.
pub fn format_duration(milliseconds: u64) -> String {
    let (seconds, millis) = (milliseconds / 1000, milliseconds % 1000);
    let (minutes, seconds) = (seconds / 60, seconds % 60);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    format!("{:02}:{:02}:{:02}.{}", hours, minutes, seconds, millis)
}

/// Most recently passed hour or half-hour mark
pub fn nearest_half_hour_mark(now: DateTime<Utc>) -> DateTime<Utc> {
    let minute = if now.minute() >= 30 { 30 } else { 0 };
    let mark = now.date_naive().and_time(NaiveTime::MIN)
        + Duration::hours(i64::from(now.hour()))
        + Duration::minutes(minute);
    Utc.from_utc_datetime(&mark)
}

/// Relative shift of a channel start time
///
/// Months count as 30 days and years as 365 days. Negative fields shift
/// backwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeShift {
    pub seconds: i64,
    pub minutes: i64,
    pub hours: i64,
    pub days: i64,
    pub months: i64,
    pub years: i64,
}

impl TimeShift {
    pub fn hours(hours: i64) -> Self {
        Self {
            hours,
            ..Self::default()
        }
    }

    pub fn minutes(minutes: i64) -> Self {
        Self {
            minutes,
            ..Self::default()
        }
    }

    pub fn days(days: i64) -> Self {
        Self {
            days,
            ..Self::default()
        }
    }

    /// Same shift in the opposite direction
    pub fn negated(self) -> Self {
        Self {
            seconds: -self.seconds,
            minutes: -self.minutes,
            hours: -self.hours,
            days: -self.days,
            months: -self.months,
            years: -self.years,
        }
    }

    /// Total shift as a chrono duration
    pub fn to_duration(self) -> Result<Duration> {
        let days = self
            .days
            .checked_add(self.months.checked_mul(30).ok_or(Error::InvalidTimeShift)?)
            .and_then(|d| d.checked_add(self.years.checked_mul(365)?))
            .ok_or(Error::InvalidTimeShift)?;

        let total_seconds = days
            .checked_mul(86_400)
            .and_then(|s| s.checked_add(self.hours.checked_mul(3600)?))
            .and_then(|s| s.checked_add(self.minutes.checked_mul(60)?))
            .and_then(|s| s.checked_add(self.seconds))
            .ok_or(Error::InvalidTimeShift)?;

        Duration::try_seconds(total_seconds).ok_or(Error::InvalidTimeShift)
    }

    /// Applies the shift to an instant
    pub fn apply(self, instant: DateTime<Utc>) -> Result<DateTime<Utc>> {
        instant
            .checked_add_signed(self.to_duration()?)
            .ok_or(Error::InvalidTimeShift)
    }
}

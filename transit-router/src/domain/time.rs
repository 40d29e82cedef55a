//! Service-day time handling.
//!
//! Timetables express times as "HH:MM" or "HH:MM:SS" strings relative to
//! the start of the service day. Trips running past midnight keep counting
//! (e.g. "25:10"), so a `Time` is a plain number of seconds and never wraps.

use chrono::Duration;
use std::fmt;
use std::ops::{Add, Sub};

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Seconds since the start of the service day.
///
/// # Examples
///
/// ```
/// use transit_router::domain::Time;
///
/// let time = Time::parse("14:30").unwrap();
/// assert_eq!(time.seconds(), 14 * 3600 + 30 * 60);
/// assert_eq!(time.to_string(), "14:30");
///
/// // Overnight trips continue past 24:00
/// let late = Time::parse("25:05:30").unwrap();
/// assert_eq!(late.to_string(), "25:05:30");
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Time(i32);

impl Time {
    /// Midnight at the start of the service day.
    pub const MIDNIGHT: Time = Time(0);

    /// Sentinel for "not reached"; later than any real time.
    pub const UNREACHED: Time = Time(i32::MAX);

    /// Create a time from seconds since midnight.
    pub const fn from_seconds(seconds: i32) -> Self {
        Time(seconds)
    }

    /// Create a time from hour, minute and second components.
    pub const fn hms(hour: i32, minute: i32, second: i32) -> Self {
        Time(hour * 3600 + minute * 60 + second)
    }

    /// Parse "HH:MM" or "HH:MM:SS".
    ///
    /// Hours may exceed 23 for trips that run past midnight.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_router::domain::Time;
    ///
    /// assert!(Time::parse("00:00").is_ok());
    /// assert!(Time::parse("23:59:59").is_ok());
    /// assert!(Time::parse("1430").is_err());
    /// assert!(Time::parse("14:60").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let bytes = s.as_bytes();
        if bytes.len() != 5 && bytes.len() != 8 {
            return Err(TimeError::new("expected HH:MM or HH:MM:SS format"));
        }
        if bytes[2] != b':' || (bytes.len() == 8 && bytes[5] != b':') {
            return Err(TimeError::new("expected colon separators"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > 47 {
            return Err(TimeError::new("hour must be 0-47"));
        }

        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let second = if bytes.len() == 8 {
            let second = parse_two_digits(&bytes[6..8])
                .ok_or_else(|| TimeError::new("invalid second digits"))?;
            if second > 59 {
                return Err(TimeError::new("second must be 0-59"));
            }
            second
        } else {
            0
        };

        Ok(Time::hms(hour as i32, minute as i32, second as i32))
    }

    /// Seconds since midnight.
    pub const fn seconds(self) -> i32 {
        self.0
    }

    /// Returns the hour, possibly 24 or more for overnight times.
    pub fn hour(self) -> i32 {
        self.0.div_euclid(3600)
    }

    /// Returns the minute (0-59).
    pub fn minute(self) -> i32 {
        self.0.rem_euclid(3600) / 60
    }

    /// Returns the second (0-59).
    pub fn second(self) -> i32 {
        self.0.rem_euclid(60)
    }

    /// Shift by a number of seconds, saturating at the representable range.
    pub fn plus_seconds(self, seconds: i32) -> Self {
        Time(self.0.saturating_add(seconds))
    }

    /// Shift back by a number of seconds, saturating at the representable range.
    pub fn minus_seconds(self, seconds: i32) -> Self {
        Time(self.0.saturating_sub(seconds))
    }

    /// Seconds from `earlier` to `self`; negative if `earlier` is after `self`.
    pub fn seconds_since(self, earlier: Time) -> i32 {
        self.0.saturating_sub(earlier.0)
    }

    /// Whether this is a real time rather than [`Time::UNREACHED`].
    pub fn is_reached(self) -> bool {
        self != Time::UNREACHED
    }
}

impl Add<Duration> for Time {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        let seconds = i32::try_from(rhs.num_seconds()).unwrap_or(i32::MAX);
        self.plus_seconds(seconds)
    }
}

impl Sub<Duration> for Time {
    type Output = Self;

    fn sub(self, rhs: Duration) -> Self::Output {
        let seconds = i32::try_from(rhs.num_seconds()).unwrap_or(i32::MAX);
        self.minus_seconds(seconds)
    }
}

impl Sub<Time> for Time {
    type Output = Duration;

    fn sub(self, rhs: Time) -> Self::Output {
        Duration::seconds(i64::from(self.0) - i64::from(rhs.0))
    }
}

impl fmt::Debug for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_reached() {
            write!(f, "Time({self})")
        } else {
            write!(f, "Time(unreached)")
        }
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.second() == 0 {
            write!(f, "{:02}:{:02}", self.hour(), self.minute())
        } else {
            write!(
                f,
                "{:02}:{:02}:{:02}",
                self.hour(),
                self.minute(),
                self.second()
            )
        }
    }
}

/// Format a number of seconds as a compact duration, e.g. "1h2m" or "3m45s".
pub fn format_duration(seconds: i32) -> String {
    if seconds == 0 {
        return "0s".to_string();
    }
    let sign = if seconds < 0 { "-" } else { "" };
    let s = seconds.unsigned_abs();
    let (h, m, sec) = (s / 3600, (s % 3600) / 60, s % 60);

    let mut out = String::from(sign);
    if h > 0 {
        out.push_str(&format!("{h}h"));
    }
    if m > 0 {
        out.push_str(&format!("{m}m"));
    }
    if sec > 0 {
        out.push_str(&format!("{sec}s"));
    }
    out
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}

//! Entry modification times.
//!
//! ZIP headers store modification times as MS-DOS date/time pairs:
//! - 2-second resolution
//! - years 1980 through 2107
//! - no time zone
//!
//! [`Timestamp`] keeps whole Unix seconds and converts to and from the DOS
//! fields. DOS fields are interpreted as UTC so that a round trip through an
//! archive is stable regardless of the machine's local zone.
//!
//! # Example
//!
//! ```rust
//! use zipmerge::Timestamp;
//!
//! let ts = Timestamp::from_unix_secs(946_684_800); // 2000-01-01 00:00:00
//! let (date, time) = ts.to_dos();
//! assert_eq!(Timestamp::from_dos(date, time), Some(ts));
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// 1980-01-01 00:00:00 UTC, the earliest representable DOS time.
const DOS_EPOCH_UNIX: i64 = 315_532_800;

/// 2107-12-31 23:59:58 UTC, the latest representable DOS time.
const DOS_MAX_UNIX: i64 = 4_354_819_198;

const SECS_PER_DAY: i64 = 86_400;

/// A modification time with one-second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    secs: i64,
}

impl Timestamp {
    /// Creates a timestamp from Unix seconds (since January 1, 1970 UTC).
    #[inline]
    pub const fn from_unix_secs(secs: i64) -> Self {
        Self { secs }
    }

    /// Returns the current time.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Creates a timestamp from a `SystemTime`, truncating sub-second parts.
    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => Self::from_unix_secs(d.as_secs() as i64),
            Err(e) => {
                let d = e.duration();
                let mut secs = -(d.as_secs() as i64);
                if d.subsec_nanos() > 0 {
                    secs -= 1;
                }
                Self::from_unix_secs(secs)
            }
        }
    }

    /// Creates a timestamp from a file's modification time.
    pub fn from_filetime(ft: filetime::FileTime) -> Self {
        Self::from_unix_secs(ft.unix_seconds())
    }

    /// Returns the timestamp as Unix seconds.
    #[inline]
    pub const fn as_unix_secs(&self) -> i64 {
        self.secs
    }

    /// Returns the timestamp as a `SystemTime`.
    pub fn as_system_time(&self) -> SystemTime {
        if self.secs >= 0 {
            UNIX_EPOCH + Duration::from_secs(self.secs as u64)
        } else {
            UNIX_EPOCH - Duration::from_secs(self.secs.unsigned_abs())
        }
    }

    /// Decodes an MS-DOS date/time pair.
    ///
    /// Returns `None` when the fields do not describe a valid calendar time
    /// (an all-zero date is common in archives written without timestamps).
    pub fn from_dos(date: u16, time: u16) -> Option<Self> {
        let year = 1980 + i64::from(date >> 9);
        let month = u32::from((date >> 5) & 0x0F);
        let day = u32::from(date & 0x1F);
        let hour = i64::from(time >> 11);
        let minute = i64::from((time >> 5) & 0x3F);
        let second = i64::from(time & 0x1F) * 2;

        if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
            return None;
        }
        if hour > 23 || minute > 59 || second > 59 {
            return None;
        }

        let days = days_from_civil(year, month, day);
        Some(Self::from_unix_secs(
            days * SECS_PER_DAY + hour * 3600 + minute * 60 + second,
        ))
    }

    /// Encodes the timestamp as an MS-DOS `(date, time)` pair.
    ///
    /// Times outside 1980–2107 are clamped to the nearest representable
    /// value; odd seconds are rounded down.
    pub fn to_dos(&self) -> (u16, u16) {
        let secs = self.secs.clamp(DOS_EPOCH_UNIX, DOS_MAX_UNIX);
        let days = secs.div_euclid(SECS_PER_DAY);
        let rem = secs.rem_euclid(SECS_PER_DAY);
        let (year, month, day) = civil_from_days(days);

        let date = (((year - 1980) as u16) << 9) | ((month as u16) << 5) | day as u16;
        let hour = (rem / 3600) as u16;
        let minute = ((rem % 3600) / 60) as u16;
        let second = (rem % 60) as u16;
        let time = (hour << 11) | (minute << 5) | (second / 2);
        (date, time)
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        Self::from_system_time(time)
    }
}

fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        _ => 28,
    }
}

/// Days since 1970-01-01 for a proleptic Gregorian date.
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let m = i64::from(month);
    let mp = if m > 2 { m - 3 } else { m + 9 };
    let doy = (153 * mp + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Inverse of [`days_from_civil`].
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Anything earlier than this means the RTC was never set (SNTP failed).
const CLOCK_SET_THRESHOLD: i64 = 1_000_000_000;

const SECS_PER_DAY: i64 = 86_400;

/// Naive wall-clock timestamp as reported by the backend's `server_time`,
/// stored as seconds since 1970-01-01T00:00:00 on the same naive scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServerTime(i64);

/// Broken-down local date and time, ready for formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalDateTime {
    pub year: i64,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl ServerTime {
    pub fn from_fields(
        year: i64,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Option<ServerTime> {
        if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
            return None;
        }
        if hour > 23 || minute > 59 || second > 60 {
            return None;
        }
        let days = days_from_civil(year, month, day);
        let secs = days * SECS_PER_DAY + (hour * 3600 + minute * 60 + second) as i64;
        Some(ServerTime(secs))
    }

    /// Parse `<int>-<int>-<int>T<int>:<int>:<int>`. Anything after the
    /// seconds field (fractional seconds, a zone suffix) is ignored and not
    /// interpreted. Returns None for any other shape.
    pub fn parse(s: &str) -> Option<ServerTime> {
        let mut scan = Scanner { rest: s };
        let year = scan.number()?;
        scan.literal('-')?;
        let month = scan.number()?;
        scan.literal('-')?;
        let day = scan.number()?;
        scan.literal('T')?;
        let hour = scan.number()?;
        scan.literal(':')?;
        let minute = scan.number()?;
        scan.literal(':')?;
        let second = scan.number()?;
        ServerTime::from_fields(year as i64, month, day, hour, minute, second)
    }

    pub fn as_secs(self) -> i64 {
        self.0
    }

    /// Advance by a monotonic interval.
    pub fn advanced_by(self, elapsed: Duration) -> ServerTime {
        ServerTime(self.0.saturating_add(elapsed.as_secs() as i64))
    }

    pub fn to_local(self) -> LocalDateTime {
        LocalDateTime::from_secs(self.0)
    }
}

struct Scanner<'a> {
    rest: &'a str,
}

impl Scanner<'_> {
    fn number(&mut self) -> Option<u32> {
        let end = self
            .rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.rest.len());
        if end == 0 {
            return None;
        }
        let (digits, rest) = self.rest.split_at(end);
        self.rest = rest;
        digits.parse().ok()
    }

    fn literal(&mut self, c: char) -> Option<()> {
        self.rest = self.rest.strip_prefix(c)?;
        Some(())
    }
}

impl LocalDateTime {
    pub fn from_secs(secs: i64) -> LocalDateTime {
        let days = secs.div_euclid(SECS_PER_DAY);
        let rem = secs.rem_euclid(SECS_PER_DAY) as u32;
        let (year, month, day) = civil_from_days(days);
        LocalDateTime {
            year,
            month,
            day,
            hour: rem / 3600,
            minute: (rem % 3600) / 60,
            second: rem % 60,
        }
    }

    /// "HH:MM"
    pub fn time_text(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }

    /// "HH:MM:SS"
    pub fn time_text_secs(&self) -> String {
        format!("{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }

    /// "DD/MM"
    pub fn date_text(&self) -> String {
        format!("{:02}/{:02}", self.day, self.month)
    }
}

/// Current UTC seconds from the system clock, or None if the clock was
/// never set.
pub fn wall_clock_now() -> Option<i64> {
    let secs = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs() as i64;
    (secs >= CLOCK_SET_THRESHOLD).then_some(secs)
}

/// Local wall time for a UTC reading and a static offset.
pub fn local_from_utc(utc_secs: i64, utc_offset_secs: i32) -> LocalDateTime {
    LocalDateTime::from_secs(utc_secs + utc_offset_secs as i64)
}

/// Time shown in the dashboard header.
///
/// Nothing is shown until a payload has carried a server time. After that
/// the header follows the local wall clock. If SNTP never succeeded, the
/// captured server time is advanced by the monotonic time elapsed since it
/// was captured instead.
pub fn header_time(
    server_time: Option<ServerTime>,
    wall_utc: Option<i64>,
    utc_offset_secs: i32,
    since_capture: Duration,
) -> Option<LocalDateTime> {
    let server_time = server_time?;
    match wall_utc {
        Some(utc) => Some(local_from_utc(utc, utc_offset_secs)),
        None => Some(server_time.advanced_by(since_capture).to_local()),
    }
}

fn is_leap(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap(year) => 29,
        2 => 28,
        _ => 0,
    }
}

// Proleptic Gregorian day counts relative to 1970-01-01.
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y.rem_euclid(400);
    let mp = (month as i64 + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_iso_timestamp() {
        let t = ServerTime::parse("2024-03-05T14:30:00").unwrap();
        assert_eq!(t.as_secs(), 1_709_649_000);
        let local = t.to_local();
        assert_eq!(local.time_text(), "14:30");
        assert_eq!(local.date_text(), "05/03");
        assert_eq!(local.year, 2024);
    }

    #[test]
    fn trailing_fraction_is_ignored() {
        let a = ServerTime::parse("2024-03-05T14:30:00.123456").unwrap();
        let b = ServerTime::parse("2024-03-05T14:30:00").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn other_shapes_are_rejected() {
        assert_eq!(ServerTime::parse("not-a-date"), None);
        assert_eq!(ServerTime::parse(""), None);
        assert_eq!(ServerTime::parse("2024-03-05 14:30:00"), None);
        assert_eq!(ServerTime::parse("2024-03-05T14:30"), None);
        assert_eq!(ServerTime::parse("2024/03/05T14:30:00"), None);
        assert_eq!(ServerTime::parse("-2024-03-05T14:30:00"), None);
        assert_eq!(ServerTime::parse("2024-13-05T14:30:00"), None);
        assert_eq!(ServerTime::parse("2023-02-29T00:00:00"), None);
        assert_eq!(ServerTime::parse("2024-03-05T24:00:00"), None);
    }

    #[test]
    fn leap_day_round_trips_through_civil_conversion() {
        let t = ServerTime::parse("2024-02-29T23:59:59").unwrap();
        let local = t.to_local();
        assert_eq!((local.year, local.month, local.day), (2024, 2, 29));
        assert_eq!(local.time_text_secs(), "23:59:59");

        let next = t.advanced_by(Duration::from_secs(1)).to_local();
        assert_eq!((next.month, next.day, next.hour), (3, 1, 0));
    }

    #[test]
    fn offset_shifts_the_date_across_midnight() {
        // 2024-03-05T23:30:00Z
        let utc = 1_709_681_400;
        let local = local_from_utc(utc, 3600);
        assert_eq!(local.time_text(), "00:30");
        assert_eq!(local.date_text(), "06/03");

        let west = local_from_utc(utc, -5 * 3600);
        assert_eq!(west.time_text(), "18:30");
        assert_eq!(west.date_text(), "05/03");
    }

    #[test]
    fn header_needs_a_server_time() {
        assert_eq!(header_time(None, Some(1_709_649_000), 0, Duration::ZERO), None);
    }

    #[test]
    fn header_follows_wall_clock_when_set() {
        let server = ServerTime::parse("2020-01-01T00:00:00");
        let shown = header_time(server, Some(1_709_649_000), 7200, Duration::from_secs(999)).unwrap();
        assert_eq!(shown.time_text(), "16:30");
        assert_eq!(shown.date_text(), "05/03");
    }

    #[test]
    fn header_advances_server_time_without_wall_clock() {
        let server = ServerTime::parse("2024-03-05T14:30:00");
        let shown = header_time(server, None, 7200, Duration::from_secs(125)).unwrap();
        assert_eq!(shown.time_text_secs(), "14:32:05");
    }
}

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::{OffsetComponents, Tz};

/// The Sunday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

/// Weekday number with 1 = Sunday .. 7 = Saturday.
pub fn day_number(t: &DateTime<Tz>) -> i16 {
    t.weekday().number_from_sunday() as i16
}

/// The day before `day`, wrapping Sunday (1) to Saturday (7).
pub fn previous_day(day: i16) -> i16 {
    if day == 1 { 7 } else { day - 1 }
}

fn dst_offset(t: DateTime<Utc>, tz: Tz) -> Duration {
    tz.offset_from_utc_datetime(&t.naive_utc()).dst_offset()
}

/// Local hour of `t` after shifting it by the DST offset difference between
/// `now` and `t`. Hours are thereby expressed in the offset in force at `now`:
/// 14:00 EST reads as 15 while daylight time is active.
pub fn normalized_hour(t: DateTime<Utc>, tz: Tz, now: DateTime<Utc>) -> u32 {
    let shifted = t + (dst_offset(now, tz) - dst_offset(t, tz));
    shifted.with_timezone(&tz).hour()
}

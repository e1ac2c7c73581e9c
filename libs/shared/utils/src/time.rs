use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

/// Clinic wall-clock offset. Schedules are entered in Chilean local time and
/// stored in UTC.
pub fn clinic_offset() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).expect("valid fixed offset")
}

/// Interprets a local clinic date+time and converts it to UTC.
pub fn clinic_local_to_utc(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    let local = date.and_time(time);
    clinic_offset()
        .from_local_datetime(&local)
        .single()
        .expect("fixed offsets have unambiguous local times")
        .with_timezone(&Utc)
}

/// Inclusive timestamp bounds covering one calendar day, in the
/// `YYYY-MM-DDTHH:MM:SS` form PostgREST range filters expect.
pub fn day_bounds(date: NaiveDate) -> (String, String) {
    (
        format!("{}T00:00:00", date.format("%Y-%m-%d")),
        format!("{}T23:59:59", date.format("%Y-%m-%d")),
    )
}

/// First and last day of the month containing `date`.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).expect("day 1 always exists");
    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    }
    .expect("day 1 always exists");
    (first, next_month - Duration::days(1))
}

/// Monday-through-Sunday week containing `date`.
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    (monday, monday + Duration::days(6))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_to_utc_adds_three_hours() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let utc = clinic_local_to_utc(date, time);
        assert_eq!(utc.to_rfc3339(), "2025-03-10T12:00:00+00:00");
    }

    #[test]
    fn day_bounds_cover_full_day() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let (start, end) = day_bounds(date);
        assert_eq!(start, "2025-07-01T00:00:00");
        assert_eq!(end, "2025-07-01T23:59:59");
    }

    #[test]
    fn month_bounds_handle_december() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 15).unwrap();
        let (first, last) = month_bounds(date);
        assert_eq!(first, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn week_starts_on_monday() {
        // 2025-06-19 is a Thursday
        let date = NaiveDate::from_ymd_opt(2025, 6, 19).unwrap();
        let (monday, sunday) = week_bounds(date);
        assert_eq!(monday, NaiveDate::from_ymd_opt(2025, 6, 16).unwrap());
        assert_eq!(sunday, NaiveDate::from_ymd_opt(2025, 6, 22).unwrap());
    }
}

use chrono::{NaiveDateTime, Utc};

const DB_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_db_time(db_time: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(db_time, DB_TIME_FORMAT).ok()
}

/// "5m ago" style label for a stored timestamp; unparseable input is shown as is.
pub fn relative_time(db_time: &str) -> String {
    parse_db_time(db_time)
        .map(|dt| format_relative_time(&dt))
        .unwrap_or_else(|| db_time.to_string())
}

/// Full date and time for a stored timestamp, e.g. "15 Jan 2025, 12:00".
pub fn full_date(db_time: &str) -> String {
    parse_db_time(db_time)
        .map(|dt| dt.format("%-d %b %Y, %H:%M").to_string())
        .unwrap_or_else(|| db_time.to_string())
}

pub fn format_relative_time(dt: &NaiveDateTime) -> String {
    let now = Utc::now().naive_utc();
    let diff = now.signed_duration_since(*dt);

    let seconds = diff.num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let minutes = diff.num_minutes();
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }

    let hours = diff.num_hours();
    if hours < 24 {
        return format!("{}h ago", hours);
    }

    let days = diff.num_days();
    if days < 7 {
        return format!("{}d ago", days);
    }

    dt.format("%b %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn format_relative_time_just_now() {
        let now = Utc::now().naive_utc();
        assert_eq!(format_relative_time(&now), "just now");
    }

    #[test]
    fn format_relative_time_minutes() {
        let dt = Utc::now().naive_utc() - chrono::Duration::minutes(5);
        assert_eq!(format_relative_time(&dt), "5m ago");
    }

    #[test]
    fn format_relative_time_hours() {
        let dt = Utc::now().naive_utc() - chrono::Duration::hours(3);
        assert_eq!(format_relative_time(&dt), "3h ago");
    }

    #[test]
    fn format_relative_time_days() {
        let dt = Utc::now().naive_utc() - chrono::Duration::days(2);
        assert_eq!(format_relative_time(&dt), "2d ago");
    }

    #[test]
    fn format_relative_time_old_date() {
        let dt = NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(format_relative_time(&dt), "Jan 15, 2025");
    }

    #[test]
    fn relative_time_handles_db_format() {
        assert_eq!(relative_time("2025-01-15 12:00:00"), "Jan 15, 2025");
        assert_eq!(relative_time("not-a-date"), "not-a-date");
    }

    #[test]
    fn full_date_formats_db_time() {
        assert_eq!(full_date("2025-01-05 09:30:00"), "5 Jan 2025, 09:30");
        assert_eq!(full_date("garbage"), "garbage");
    }
}

use chrono::{Duration, NaiveDate};

pub const SECONDS_PER_DAY: i64 = 24 * 3600;

#[derive(Clone, Debug)]
pub enum Clock {
    System,
    Test(NaiveDate),
}

impl Clock {
    #[must_use]
    pub fn system() -> Self {
        Clock::System
    }

    #[must_use]
    pub fn with_today(today: NaiveDate) -> Self {
        Clock::Test(today)
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        match self {
            Clock::System => chrono::Local::now().date_naive(),
            Clock::Test(today) => *today,
        }
    }

    #[must_use]
    pub fn today_str(&self) -> String {
        self.today().format("%Y-%m-%d").to_string()
    }
}

/// Parses a `HH:MM` time into seconds since midnight. Returns `None` for
/// anything that is not two digit pairs separated by a colon.
#[must_use]
pub fn time_str_to_seconds(time: &str) -> Option<i64> {
    let bytes = time.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return None;
    }
    if !bytes[0].is_ascii_digit()
        || !bytes[1].is_ascii_digit()
        || !bytes[3].is_ascii_digit()
        || !bytes[4].is_ascii_digit()
    {
        return None;
    }
    let hours = i64::from(bytes[0] - b'0') * 10 + i64::from(bytes[1] - b'0');
    let minutes = i64::from(bytes[3] - b'0') * 10 + i64::from(bytes[4] - b'0');
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 3600 + minutes * 60)
}

/// Duration between two wall-clock times, wrapping across midnight when the
/// end precedes the start.
#[must_use]
pub fn interval_duration_seconds(start_seconds: i64, end_seconds: i64) -> i64 {
    (end_seconds - start_seconds + SECONDS_PER_DAY) % SECONDS_PER_DAY
}

/// Renders a duration as `"Xh Ym"` for the query output paths.
#[must_use]
pub fn format_duration(total_seconds: i64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    format!("{hours}h {minutes}m")
}

/// Shifts an ISO date string by `days`; returns the input unchanged when it
/// does not parse.
#[must_use]
pub fn add_days_to_date_str(date: &str, days: i64) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(parsed) => (parsed + Duration::days(days)).format("%Y-%m-%d").to_string(),
        Err(_) => date.to_string(),
    }
}

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

impl Profile {
    pub fn app_name(self) -> &'static str {
        match self {
            Profile::Dev => "creator-studio-dev",
            Profile::Prod => "creator-studio",
        }
    }
}

/// Configuration directory for the given profile
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "creator-studio", profile.app_name())
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Data directory (database, logs) for the given profile
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "creator-studio", profile.app_name())
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Parse a date string in ISO 8601 format (YYYY-MM-DD)
pub fn parse_date(date_str: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
}

/// Parse a time of day in `HH:mm` form
pub fn parse_time(time_str: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(time_str, "%H:%M")
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Today's local date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Current time in milliseconds since the epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Local wall-clock time of an epoch-milliseconds timestamp
pub fn local_datetime(millis: i64) -> Option<NaiveDateTime> {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.naive_local())
}

/// Epoch milliseconds of a local wall-clock time; the earlier instant wins
/// when the time is ambiguous
pub fn local_millis(datetime: NaiveDateTime) -> Option<i64> {
    Local
        .from_local_datetime(&datetime)
        .earliest()
        .map(|dt| dt.timestamp_millis())
}

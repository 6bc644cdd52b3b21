use chrono::{NaiveDate, TimeDelta, Utc};
use thiserror::Error;

/// Lookback window used when the caller does not pick one.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 100;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Login {0:?} contains characters that cannot appear in a GitHub login")]
    InvalidLogin(String),

    #[error("Lookback window of {0} days is out of range")]
    WindowOutOfRange(i64),
}

/// A GitHub login checked to be safe for interpolation into a search predicate.
///
/// Logins are ASCII alphanumerics, hyphens and underscores (Enterprise Managed
/// Users end in `_<shortcode>`); app accounts carry a `[bot]` suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Login(String);

impl Login {
    pub fn parse(raw: &str) -> Result<Login, QueryError> {
        let name = raw.strip_suffix("[bot]").unwrap_or(raw);
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(QueryError::InvalidLogin(raw.to_string()));
        }
        Ok(Login(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Login {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive creation-date window, rendered as `YYYY-MM-DD..YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Today's date on the UTC calendar.
pub fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Window of `days` ending at `today`.
///
/// `days` is not validated: zero gives a single-day window and a negative
/// count puts `start` after `end`. Only arithmetic overflow is rejected.
pub fn compute_date_range(days: i64, today: NaiveDate) -> Result<DateRange, QueryError> {
    let window = TimeDelta::try_days(days).ok_or(QueryError::WindowOutOfRange(days))?;
    let start = today
        .checked_sub_signed(window)
        .ok_or(QueryError::WindowOutOfRange(days))?;
    Ok(DateRange { start, end: today })
}

/// Search predicate for pull requests authored by `login` and created inside `range`.
pub fn build_query(login: &Login, range: &DateRange) -> String {
    format!("type:pr author:{} created:{}", login, range)
}

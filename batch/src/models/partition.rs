use chrono::{NaiveDate, NaiveDateTime, Timelike};
use common::{Error, Result};
use std::fmt;

/// Directory naming of the day component, e.g. `2024_01_15`.
pub const DAY_FORMAT: &str = "%Y_%m_%d";

/// One hourly ingestion unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartitionKey {
    date: NaiveDate,
    hour: u32,
}

impl PartitionKey {
    pub fn new(date: NaiveDate, hour: u32) -> Result<Self> {
        if hour > 23 {
            return Err(Error::Configuration(format!(
                "hour must be between 0 and 23, got {}",
                hour
            )));
        }
        Ok(Self { date, hour })
    }

    pub fn parse(day: &str, hour: &str) -> Result<Self> {
        let date = NaiveDate::parse_from_str(day.trim(), DAY_FORMAT).map_err(|e| {
            Error::Configuration(format!("invalid day '{}' (expected YYYY_MM_DD): {}", day, e))
        })?;
        let hour = hour
            .trim()
            .parse::<u32>()
            .map_err(|e| Error::Configuration(format!("invalid hour '{}': {}", hour, e)))?;
        Self::new(date, hour)
    }

    /// Resolves CLI input: both values or neither. Neither falls back to `now`.
    pub fn resolve(day: Option<&str>, hour: Option<&str>, now: NaiveDateTime) -> Result<Self> {
        match (day, hour) {
            (Some(day), Some(hour)) => Self::parse(day, hour),
            (None, None) => Self::new(now.date(), now.hour()),
            _ => Err(Error::Configuration(
                "Both --day and --hour must be provided together".to_string(),
            )),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn day_dir(&self) -> String {
        self.date.format(DAY_FORMAT).to_string()
    }

    pub fn hour_dir(&self) -> String {
        format!("{:02}", self.hour)
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.day_dir(), self.hour_dir())
    }
}

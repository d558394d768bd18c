use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::Deserialize;
use serde::Serialize;

use crate::ValidationError;

pub const TIME_FORMAT: &str = "%H:%M";

/// A closed time-of-day interval `[start, stop]` used for courier working
/// hours and order delivery hours. The only way to obtain one is through
/// `TimeSpan::new` or by parsing "HH:MM-HH:MM", so `start < stop` always
/// holds.
#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSpan
{
    start: NaiveTime,
    stop: NaiveTime,
}

impl TimeSpan
{
    pub fn new(start: NaiveTime, stop: NaiveTime) -> Result<Self, ValidationError>
    {
        if start >= stop {
            return Err(ValidationError::StartNotBeforeStop { start, stop });
        }
        Ok(Self { start, stop })
    }

    pub fn start(&self) -> NaiveTime
    {
        self.start
    }

    pub fn stop(&self) -> NaiveTime
    {
        self.stop
    }

    /// Touching endpoints overlap, `09:00-12:00` and `12:00-13:00` share
    /// the instant 12:00.
    pub fn overlaps(&self, other: &TimeSpan) -> bool
    {
        self.start <= other.stop && other.start <= self.stop
    }
}

impl FromStr for TimeSpan
{
    type Err = ValidationError;

    fn from_str(time_span: &str) -> Result<Self, Self::Err>
    {
        let malformed = || ValidationError::MalformedTimeSpan(time_span.to_string());

        if time_span.trim() != time_span
        {
            return Err(malformed());
        }

        let (start, stop) = time_span.split_once('-').ok_or_else(malformed)?;

        let start = NaiveTime::parse_from_str(start, TIME_FORMAT).map_err(|_| malformed())?;
        let stop = NaiveTime::parse_from_str(stop, TIME_FORMAT).map_err(|_| malformed())?;

        TimeSpan::new(start, stop)
    }
}

impl TryFrom<String> for TimeSpan
{
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error>
    {
        value.parse()
    }
}

impl From<TimeSpan> for String
{
    fn from(value: TimeSpan) -> Self
    {
        value.to_string()
    }
}

impl fmt::Display for TimeSpan
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(
            f,
            "{}-{}",
            self.start.format(TIME_FORMAT),
            self.stop.format(TIME_FORMAT)
        )
    }
}

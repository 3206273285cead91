//! The schedule document served by the collection API.
//!
//! Two response shapes are in the wild. Newer servers return the schedule
//! object as the body:
//!
//! ```json
//! { "collections": [{ "label": "Recycling", "colour": { "rgb": [0, 128, 255] } }],
//!   "mp_start_date": { "year": 2024, "month": 5, "mday": 1, ... },
//!   "mp_end_date": { ... } }
//! ```
//!
//! Older ones wrap it in a JSON string under `value`:
//!
//! ```json
//! { "value": "{\"collections\": [...], \"stop_at\": \"...\"}" }
//! ```

use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::color::Rgb;
use crate::error::ParseError;
use crate::svc::Timestamp;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionEvent {
    pub label: String,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub collections: Vec<CollectionEvent>,
    pub active_from: Timestamp,
    pub active_until: Timestamp,
}

impl Schedule {
    /// Parses a response body. Missing window bounds default to
    /// `[fetched_at, fetched_at + poll_interval)`.
    pub fn parse(
        body: &[u8],
        fetched_at: Timestamp,
        poll_interval: Duration,
    ) -> Result<Schedule, ParseError> {
        let value: Value = serde_json::from_slice(body)?;

        let document = match ScheduleDocument::deserialize(&value) {
            Ok(document) => document,
            Err(e) => match value.get("value") {
                Some(Value::String(inner)) => {
                    log::debug!("Schedule is wrapped in a string, decoding again");
                    serde_json::from_str(inner)?
                }
                _ => return Err(e.into()),
            },
        };

        document.resolve(fetched_at, poll_interval)
    }

    /// True inside `[active_from, active_until)`.
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.active_from <= now && now < self.active_until
    }
}

/// Broken-down time as sent by the server.
///
/// `weekday` counts from Monday = 0, `yearday` from January 1st = 1. Both are
/// derived from the date and ignored when converting to a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarTime {
    pub year: i32,
    pub month: u32,
    pub mday: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    #[serde(default)]
    pub weekday: u32,
    #[serde(default)]
    pub yearday: u32,
}

impl CalendarTime {
    /// `None` when the fields do not name a real date and time.
    pub fn to_timestamp(&self) -> Option<Timestamp> {
        let naive = chrono::NaiveDate::from_ymd_opt(self.year, self.month, self.mday)?
            .and_hms_opt(self.hour, self.minute, self.second)?;
        Some(Timestamp::from_secs(
            Utc.from_utc_datetime(&naive).timestamp(),
        ))
    }

    pub fn from_timestamp(t: Timestamp) -> Option<Self> {
        let time = Utc.timestamp_opt(t.as_secs(), 0).single()?;
        Some(Self::from_datetime(&time))
    }

    fn from_datetime(time: &DateTime<Utc>) -> Self {
        CalendarTime {
            year: time.year(),
            month: time.month(),
            mday: time.day(),
            hour: time.hour(),
            minute: time.minute(),
            second: time.second(),
            weekday: time.weekday().num_days_from_monday(),
            yearday: time.ordinal(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TimeValue {
    /// Seconds since the epoch.
    Epoch(f64),
    Text(String),
    Calendar(CalendarTime),
}

impl TimeValue {
    fn to_timestamp(&self) -> Result<Timestamp, ParseError> {
        match self {
            TimeValue::Epoch(secs) => Ok(Timestamp::from_millis((secs * 1000.0).round() as i64)),
            TimeValue::Text(s) => parse_time_text(s),
            TimeValue::Calendar(calendar) => calendar
                .to_timestamp()
                .ok_or(ParseError::InvalidCalendar(*calendar)),
        }
    }
}

// RFC 3339, or ISO 8601 without an offset which is taken as UTC.
fn parse_time_text(s: &str) -> Result<Timestamp, ParseError> {
    if let Ok(time) = DateTime::parse_from_rfc3339(s) {
        return Ok(Timestamp::from_millis(time.timestamp_millis()));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Timestamp::from_millis(Utc.from_utc_datetime(&naive).timestamp_millis()))
        .map_err(|_| ParseError::InvalidTimestamp(s.to_owned()))
}

#[derive(Debug, Deserialize)]
struct ColorDocument {
    rgb: [u8; 3],
}

#[derive(Debug, Deserialize)]
struct CollectionDocument {
    #[serde(default, alias = "name")]
    label: String,
    #[serde(alias = "colour")]
    color: ColorDocument,
}

#[derive(Debug, Deserialize)]
struct ScheduleDocument {
    collections: Vec<CollectionDocument>,
    #[serde(default, alias = "activeFrom")]
    active_from: Option<TimeValue>,
    #[serde(default, alias = "mpStartDate")]
    mp_start_date: Option<TimeValue>,
    #[serde(default, alias = "activeUntil")]
    active_until: Option<TimeValue>,
    #[serde(default, alias = "mpEndDate")]
    mp_end_date: Option<TimeValue>,
    #[serde(default, alias = "stopAt")]
    stop_at: Option<TimeValue>,
}

impl ScheduleDocument {
    fn resolve(self, fetched_at: Timestamp, poll_interval: Duration) -> Result<Schedule, ParseError> {
        let active_from = match self.active_from.or(self.mp_start_date) {
            Some(t) => t.to_timestamp()?,
            None => {
                log::info!("No start time specified, starting now");
                fetched_at
            }
        };

        let active_until = match self.active_until.or(self.mp_end_date).or(self.stop_at) {
            Some(t) => t.to_timestamp()?,
            None => {
                log::info!("No stop time specified, using the poll interval");
                fetched_at + poll_interval
            }
        };

        if active_from > active_until {
            return Err(ParseError::InvertedWindow {
                from: active_from,
                until: active_until,
            });
        }

        let collections = self
            .collections
            .into_iter()
            .map(|c| CollectionEvent {
                label: c.label,
                color: Rgb::from(c.color.rgb),
            })
            .collect();

        Ok(Schedule {
            collections,
            active_from,
            active_until,
        })
    }
}

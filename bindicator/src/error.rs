use crate::app::schedule::CalendarTime;
use crate::svc::Timestamp;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0:#}")]
    Transport(anyhow::Error),
    #[error("server responded with HTTP {0}")]
    Status(u16),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed schedule: {0}")]
    Json(#[from] serde_json::Error),
    #[error("calendar fields do not name a valid time: {0:?}")]
    InvalidCalendar(CalendarTime),
    #[error("unrecognized timestamp {0:?}")]
    InvalidTimestamp(String),
    #[error("active window ends ({until}) before it starts ({from})")]
    InvertedWindow { from: Timestamp, until: Timestamp },
}

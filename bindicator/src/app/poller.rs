use std::time::Duration;

use crate::app::schedule::Schedule;
use crate::error::FetchError;
use crate::svc::{Clock, HttpClient};

pub struct Poller<'a> {
    http: &'a dyn HttpClient,
    clock: &'a dyn Clock,
    poll_interval: Duration,
}

impl<'a> Poller<'a> {
    pub fn new(http: &'a dyn HttpClient, clock: &'a dyn Clock, poll_interval: Duration) -> Self {
        Self {
            http,
            clock,
            poll_interval,
        }
    }

    /// One authenticated GET, no retries.
    pub fn fetch_schedule(&self, url: &str, auth_token: &str) -> Result<Schedule, FetchError> {
        let fetched_at = self.clock.now();
        log::info!("Requesting URL: {url}");

        let authorization = format!("Basic {auth_token}");
        let response = self
            .http
            .get(url, &[("Authorization", authorization.as_str())])
            .map_err(FetchError::Transport)?;

        if !response.is_success() {
            return Err(FetchError::Status(response.status));
        }

        log::trace!("{}", String::from_utf8_lossy(&response.body));

        let schedule = Schedule::parse(&response.body, fetched_at, self.poll_interval)?;
        log::info!(
            "Data obtained: {} collections, active from {} until {}",
            schedule.collections.len(),
            schedule.active_from,
            schedule.active_until
        );
        Ok(schedule)
    }
}

use std::time::Duration;

use crate::app::animator::AnimationConfig;
use crate::app::retry::RetryPolicy;
use crate::app::supervisor::SupervisorConfig;
use crate::color::Rgb;

pub const DEFAULT_URL: &str = "https://bindicator.hannett.dev/auth/next-collection";
pub const DEFAULT_STRIP_LEN: usize = 50;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub url: String,
    /// Sent as `Authorization: Basic <auth_token>`.
    pub auth_token: String,
    pub strip_len: usize,
    /// Time between the end of an active window and the next fetch. Also the
    /// length of the default window when the server does not send one.
    pub poll_interval: Duration,
    /// How long each collection color is held.
    pub dwell: Duration,
    /// Upper bound on a single wait while outside the active window.
    pub idle_tick: Duration,
    /// How long the status LED stays on after a successful fetch.
    pub status_flash: Duration,
    /// Shown while waiting for the window to open. `None` leaves whatever the
    /// strip was showing.
    pub dormant_color: Option<Rgb>,
    pub retry: RetryPolicy,
    pub supervisor: SupervisorConfig,
    pub animation: AnimationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_owned(),
            auth_token: String::new(),
            strip_len: DEFAULT_STRIP_LEN,
            poll_interval: DEFAULT_POLL_INTERVAL,
            dwell: Duration::from_secs(2),
            idle_tick: Duration::from_secs(1),
            status_flash: Duration::from_millis(200),
            dormant_color: None,
            retry: RetryPolicy::default(),
            supervisor: SupervisorConfig::default(),
            animation: AnimationConfig::default(),
        }
    }
}

impl Config {
    /// Reads the settings baked in at build time, falling back to defaults.
    pub fn from_env_vars() -> Self {
        Self::from_values(
            option_env!("BINDICATOR_URL"),
            option_env!("BINDICATOR_AUTH_TOKEN"),
            option_env!("BINDICATOR_POLL_INTERVAL_SECS"),
        )
    }

    fn from_values(url: Option<&str>, auth_token: Option<&str>, poll_secs: Option<&str>) -> Self {
        let mut config = Config::default();

        if let Some(url) = url {
            config.url = url.to_owned();
        }

        if let Some(auth_token) = auth_token {
            config.auth_token = auth_token.to_owned();
        } else {
            log::warn!("No auth token configured");
        }

        if let Some(secs) = poll_secs {
            match secs.parse() {
                Ok(secs) => config.poll_interval = Duration::from_secs(secs),
                Err(e) => log::error!("Invalid poll interval {secs:?}: {e}"),
            }
        }

        config
    }
}

use crate::app::animator::{AnimationExit, Animator};
use crate::app::display::DisplayContext;
use crate::app::poller::Poller;
use crate::app::schedule::Schedule;
use crate::app::supervisor::{ConnectionState, Supervisor};
use crate::config::Config;
use crate::error::FetchError;
use crate::hal::wifi::WifiConfig;
use crate::hal::Platform;
use crate::svc::CancelToken;

pub mod animator;
pub mod display;
pub mod poller;
pub mod retry;
pub mod schedule;
pub mod supervisor;

#[derive(Default, Copy, Clone, Eq, PartialEq, Debug)]
pub enum IndicatorState {
    #[default]
    IdleWaitingForWindow,
    ActiveCycling,
    SleepingUntilNextPoll,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CycleOutcome {
    /// A schedule was fetched and its window has run out.
    Displayed,
    /// Every attempt failed; the fallback animation ran until the next poll.
    FetchFailed,
}

pub struct App<'a> {
    platform: &'a dyn Platform,
    config: &'a Config,
    state: IndicatorState,
    schedule: Option<Schedule>,
    fallback_cancel: CancelToken,
}

impl<'a> App<'a> {
    pub fn new(platform: &'a dyn Platform, config: &'a Config) -> Self {
        Self {
            platform,
            config,
            state: IndicatorState::default(),
            schedule: None,
            fallback_cancel: CancelToken::new(),
        }
    }

    /// Cancelling it ends the current fallback period and every later one
    /// early, so each failed cycle goes straight on to the next fetch.
    pub fn fallback_cancel_token(&self) -> CancelToken {
        self.fallback_cancel.clone()
    }

    pub fn state(&self) -> IndicatorState {
        self.state
    }

    /// The last schedule fetched successfully.
    pub fn schedule(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }

    /// Brings up the strip and the network, then sets the clock.
    ///
    /// Without a connection this shows the fallback animation and returns
    /// only if the supervisor reconnects or its fallback gets cancelled.
    pub fn start(&mut self, credentials: &WifiConfig) -> ConnectionState {
        let platform = self.platform;

        if let Err(e) = platform.led_strip().begin_continuous_refresh() {
            log::error!("Cannot start LED strip refresh: {e:#}");
        }

        let mut ctx = DisplayContext::new(platform.led_strip(), platform.status_led());
        let mut supervisor = Supervisor::new(
            platform.wifi(),
            platform.clock(),
            self.config.supervisor,
            self.config.animation,
        );

        let state = supervisor.connect(&mut ctx, credentials);

        if state == ConnectionState::Connected {
            self.sync_time();
        }

        state
    }

    fn sync_time(&self) {
        log::info!("Setting time via NTP...");
        match self.platform.time_sync().sync() {
            Ok(()) => log::info!("Current time is {}", self.platform.clock().now()),
            Err(e) => log::warn!("Clock unsynchronized, active windows may be off: {e:#}"),
        }
    }

    pub fn run(&mut self) -> ! {
        log::info!("Start loop");
        loop {
            self.run_cycle();
        }
    }

    /// One poll cycle: fetch, show the window, sleep.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        let platform = self.platform;
        let clock = platform.clock();
        let mut ctx = DisplayContext::new(platform.led_strip(), platform.status_led());

        match self.fetch() {
            Ok(schedule) => {
                self.flash_status_led(&mut ctx);
                self.drive_window(&mut ctx, &schedule);
                self.schedule = Some(schedule);

                self.set_state(IndicatorState::SleepingUntilNextPoll);
                log::info!(
                    "Getting a new schedule at {}",
                    clock.now() + self.config.poll_interval
                );
                clock.sleep(self.config.poll_interval);
                CycleOutcome::Displayed
            }
            Err(e) => {
                log::error!("Cannot fetch schedule: {e}");
                self.show_fallback_until_next_poll(&mut ctx);
                CycleOutcome::FetchFailed
            }
        }
    }

    fn fetch(&self) -> Result<Schedule, FetchError> {
        let clock = self.platform.clock();
        let poller = Poller::new(self.platform.http_client(), clock, self.config.poll_interval);
        self.config.retry.run(clock, |_attempt| {
            poller.fetch_schedule(&self.config.url, &self.config.auth_token)
        })
    }

    fn flash_status_led(&self, ctx: &mut DisplayContext) {
        ctx.set_status_led(true);
        self.platform.clock().sleep(self.config.status_flash);
        ctx.set_status_led(false);
    }

    /// Cycles the collection colors until `active_until`.
    fn drive_window(&mut self, ctx: &mut DisplayContext, schedule: &Schedule) {
        let clock = self.platform.clock();
        let collections = &schedule.collections;
        let mut next = 0;
        let mut dormant = false;

        log::info!("Current time is {}", clock.now());

        loop {
            let now = clock.now();
            if now >= schedule.active_until {
                break;
            }

            if now < schedule.active_from {
                self.set_state(IndicatorState::IdleWaitingForWindow);
                if !dormant {
                    dormant = true;
                    if let Some(color) = self.config.dormant_color {
                        ctx.fill(color);
                    }
                }
                let until_open = schedule.active_from.duration_since(now);
                clock.sleep(self.config.idle_tick.min(until_open));
                continue;
            }

            self.set_state(IndicatorState::ActiveCycling);

            let Some(collection) = collections.get(next) else {
                // Nothing to show; leave the strip alone until the window ends.
                let until_close = schedule.active_until.duration_since(now);
                clock.sleep(self.config.idle_tick.min(until_close));
                continue;
            };

            log::info!("Collection: {:?} {:?}", collection.label, collection.color);
            ctx.fill(collection.color);
            next = (next + 1) % collections.len();
            clock.sleep(self.config.dwell);
        }
    }

    fn show_fallback_until_next_poll(&mut self, ctx: &mut DisplayContext) {
        let clock = self.platform.clock();
        let deadline = clock.now() + self.config.poll_interval;
        self.set_state(IndicatorState::SleepingUntilNextPoll);

        let mut animator = Animator::new(self.config.animation, ctx.strip_len());
        if animator.run_until(ctx, clock, deadline, &self.fallback_cancel) == AnimationExit::Cancelled
        {
            log::info!("Fetching again without waiting for the poll interval");
        }
    }

    fn set_state(&mut self, state: IndicatorState) {
        if self.state != state {
            log::debug!("{:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::app::retry::RetryPolicy;
    use crate::color::Rgb;
    use crate::svc::{Clock, Timestamp};
    use crate::testing::{MockPlatform, T0};

    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);
    const GREEN: Rgb = Rgb::new(0, 255, 0);

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn window_body(from: Timestamp, until: Timestamp, collections: &str) -> String {
        format!(
            r#"{{"collections": {collections}, "active_from": {}, "active_until": {}}}"#,
            from.as_millis() as f64 / 1000.0,
            until.as_millis() as f64 / 1000.0
        )
    }

    const RED_GREEN: &str = r#"[
        {"label": "red", "colour": {"rgb": [255, 0, 0]}},
        {"label": "green", "colour": {"rgb": [0, 255, 0]}}
    ]"#;

    fn test_config() -> Config {
        Config {
            auth_token: "token".to_owned(),
            retry: RetryPolicy::no_retry(),
            status_flash: Duration::ZERO,
            ..Config::default()
        }
    }

    #[test_log::test]
    fn test_cycles_colors_through_the_window() {
        let platform = MockPlatform::new(50);
        let config = test_config();
        platform
            .http
            .push_ok(&window_body(T0, T0 + secs(10), RED_GREEN));
        let mut app = App::new(&platform, &config);

        assert_eq!(app.run_cycle(), CycleOutcome::Displayed);

        let fills = platform.strip.fills();
        assert_eq!(
            fills,
            vec![
                (T0, RED),
                (T0 + secs(2), GREEN),
                (T0 + secs(4), RED),
                (T0 + secs(6), GREEN),
                (T0 + secs(8), RED),
            ]
        );
        assert!(platform
            .strip
            .frames()
            .iter()
            .all(|(_, pixels)| pixels.len() == 50));
        assert_eq!(app.state(), IndicatorState::SleepingUntilNextPoll);
        assert_eq!(platform.clock.now(), T0 + secs(10) + config.poll_interval);
    }

    #[test_log::test]
    fn test_empty_collections_leave_the_strip_alone() {
        let platform = MockPlatform::new(8);
        let config = test_config();
        platform.http.push_ok(&window_body(T0, T0 + secs(30), "[]"));
        let mut app = App::new(&platform, &config);

        assert_eq!(app.run_cycle(), CycleOutcome::Displayed);

        assert!(platform.strip.frames().is_empty());
        assert_eq!(platform.strip.pixels(), vec![Rgb::BLACK; 8]);
        assert_eq!(app.schedule().unwrap().collections.len(), 0);
    }

    #[test_log::test]
    fn test_waits_for_the_window_to_open() {
        let platform = MockPlatform::new(3);
        let config = test_config();
        let from = T0 + Duration::from_millis(5_500);
        platform
            .http
            .push_ok(&window_body(from, from + secs(3), RED_GREEN));
        let mut app = App::new(&platform, &config);

        app.run_cycle();

        let fills = platform.strip.fills();
        assert_eq!(fills, vec![(from, RED), (from + secs(2), GREEN)]);
        // Idle waits never overshoot the start of the window.
        let sleeps = platform.clock.sleeps();
        assert_eq!(
            &sleeps[1..7],
            &[
                secs(1),
                secs(1),
                secs(1),
                secs(1),
                secs(1),
                Duration::from_millis(500)
            ]
        );
    }

    #[test_log::test]
    fn test_dormant_color_is_shown_before_the_window() {
        let platform = MockPlatform::new(3);
        let config = Config {
            dormant_color: Some(Rgb::new(0, 0, 16)),
            ..test_config()
        };
        let from = T0 + secs(3);
        platform
            .http
            .push_ok(&window_body(from, from + secs(1), RED_GREEN));
        let mut app = App::new(&platform, &config);

        app.run_cycle();

        assert_eq!(
            platform.strip.fills(),
            vec![(T0, Rgb::new(0, 0, 16)), (from, RED)]
        );
    }

    #[test_log::test]
    fn test_default_window_is_one_poll_interval() {
        let platform = MockPlatform::new(2);
        let config = Config {
            poll_interval: secs(5),
            ..test_config()
        };
        platform
            .http
            .push_ok(r#"{"collections": [{"colour": {"rgb": [255, 0, 0]}}]}"#);
        let mut app = App::new(&platform, &config);

        app.run_cycle();

        let schedule = app.schedule().unwrap();
        assert_eq!(schedule.active_from, T0);
        assert_eq!(schedule.active_until, T0 + secs(5));
        assert_eq!(platform.strip.fills().len(), 3);
    }

    #[test_log::test]
    fn test_status_led_flashes_after_fetch() {
        let platform = MockPlatform::new(2);
        let config = Config {
            status_flash: Duration::from_millis(200),
            ..test_config()
        };
        platform.http.push_ok(&window_body(T0, T0, "[]"));
        let mut app = App::new(&platform, &config);

        app.run_cycle();

        assert_eq!(
            platform.status_led.events(),
            vec![(T0, true), (T0 + Duration::from_millis(200), false)]
        );
    }

    #[test_log::test]
    fn test_fetch_failure_keeps_previous_schedule_and_falls_back() {
        let platform = MockPlatform::new(4);
        let config = Config {
            poll_interval: secs(1),
            ..test_config()
        };
        platform
            .http
            .push_ok(&window_body(T0, T0 + secs(1), RED_GREEN));
        platform.http.push_transport_error();
        let mut app = App::new(&platform, &config);

        assert_eq!(app.run_cycle(), CycleOutcome::Displayed);
        let first = app.schedule().cloned();
        let frames_before = platform.strip.frames().len();

        assert_eq!(app.run_cycle(), CycleOutcome::FetchFailed);

        assert_eq!(app.schedule().cloned(), first);
        let frames = platform.strip.frames();
        assert!(frames.len() > frames_before);
        // Only animation frames after the failure, never the old colors.
        assert!(frames[frames_before..]
            .iter()
            .all(|(_, pixels)| !pixels.iter().all(|p| *p == RED || *p == GREEN)));
        assert_eq!(platform.status_led.events().len(), 2);
    }

    #[test_log::test]
    fn test_cancelled_fallback_skips_the_wait() {
        let platform = MockPlatform::new(4);
        let config = test_config();
        platform.http.push_status(500);
        let mut app = App::new(&platform, &config);
        app.fallback_cancel_token().cancel();

        assert_eq!(app.run_cycle(), CycleOutcome::FetchFailed);

        assert!(platform.strip.frames().is_empty());
        assert_eq!(platform.clock.now(), T0);
        assert_eq!(app.state(), IndicatorState::SleepingUntilNextPoll);
    }

    #[test_log::test]
    fn test_retries_before_giving_up() {
        let platform = MockPlatform::new(1);
        let config = Config {
            retry: RetryPolicy {
                max_attempts: 3,
                initial_backoff: secs(5),
                max_backoff: secs(60),
                multiplier: 2,
            },
            ..test_config()
        };
        platform.http.push_status(503);
        platform.http.push_transport_error();
        platform.http.push_ok(&window_body(T0, T0, "[]"));
        let mut app = App::new(&platform, &config);

        assert_eq!(app.run_cycle(), CycleOutcome::Displayed);
        assert_eq!(platform.http.requests().len(), 3);
        assert_eq!(&platform.clock.sleeps()[..2], &[secs(5), secs(10)]);
    }

    #[test_log::test]
    fn test_start_connects_and_syncs_time() {
        let platform = MockPlatform::new(3);
        let config = test_config();
        let mut app = App::new(&platform, &config);

        let state = app.start(&WifiConfig::default());

        assert_eq!(state, ConnectionState::Connected);
        assert!(platform.strip.refreshing.get());
        assert_eq!(platform.time_sync.calls.get(), 1);
    }

    #[test_log::test]
    fn test_start_survives_time_sync_failure() {
        let platform = MockPlatform::new(3);
        platform.time_sync.fail.set(true);
        let config = test_config();
        let mut app = App::new(&platform, &config);

        assert_eq!(app.start(&WifiConfig::default()), ConnectionState::Connected);
        assert_eq!(platform.time_sync.calls.get(), 1);
    }
}

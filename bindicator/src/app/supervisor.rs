use std::time::Duration;

use crate::app::animator::{AnimationConfig, AnimationExit, Animator};
use crate::app::display::DisplayContext;
use crate::color::Rgb;
use crate::hal::wifi::{Wifi, WifiConfig};
use crate::svc::{CancelToken, Clock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorConfig {
    /// Delay between lighting consecutive pixels of the connect flash.
    pub flash_step: Duration,
    /// How long association may stay pending before it counts as failed.
    pub connect_timeout: Duration,
    /// While in fallback, how often to try associating again. `None` stays in
    /// fallback until cancelled, leaving a reboot as the way back.
    pub reconnect_interval: Option<Duration>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            flash_step: Duration::from_millis(20),
            connect_timeout: Duration::from_secs(30),
            reconnect_interval: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Failed,
}

pub struct Supervisor<'a> {
    wifi: &'a dyn Wifi,
    clock: &'a dyn Clock,
    config: SupervisorConfig,
    animation: AnimationConfig,
    state: ConnectionState,
    cancel: CancelToken,
}

impl<'a> Supervisor<'a> {
    pub fn new(
        wifi: &'a dyn Wifi,
        clock: &'a dyn Clock,
        config: SupervisorConfig,
        animation: AnimationConfig,
    ) -> Self {
        Self {
            wifi,
            clock,
            config,
            animation,
            state: ConnectionState::Connecting,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Cancelling it ends the fallback animation; `connect` then returns
    /// [`ConnectionState::Failed`].
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Associates with the network. On failure this shows the fallback
    /// animation and only returns once a reconnect succeeds or the fallback
    /// is cancelled.
    pub fn connect(
        &mut self,
        ctx: &mut DisplayContext,
        credentials: &WifiConfig,
    ) -> ConnectionState {
        match self.try_associate(ctx, credentials) {
            ConnectionState::Connected => ConnectionState::Connected,
            _ => self.fallback(ctx, credentials),
        }
    }

    fn try_associate(
        &mut self,
        ctx: &mut DisplayContext,
        credentials: &WifiConfig,
    ) -> ConnectionState {
        self.set_state(ConnectionState::Connecting);
        log::info!("Connecting to Wi-Fi {:?}", credentials.ssid);

        if let Err(e) = self.wifi.setup(credentials) {
            log::error!("Wi-Fi connection failed: {e:#}");
            self.set_state(ConnectionState::Failed);
            return self.state;
        }

        let deadline = self.clock.now() + self.config.connect_timeout;

        loop {
            self.flash(ctx);

            if self.wifi.is_connected() {
                log::info!("Wi-Fi connection successful");
                self.set_state(ConnectionState::Connected);
                return self.state;
            }

            if self.clock.now() >= deadline {
                log::error!(
                    "Wi-Fi connection failed: not connected after {}s",
                    self.config.connect_timeout.as_secs()
                );
                self.set_state(ConnectionState::Failed);
                return self.state;
            }
        }
    }

    // White wipe along the strip, then everything off.
    fn flash(&self, ctx: &mut DisplayContext) {
        for index in 0..ctx.strip_len() {
            ctx.set_pixel(index, Rgb::WHITE);
            self.clock.sleep(self.config.flash_step);
        }
        ctx.fill(Rgb::BLACK);
        self.clock.sleep(self.config.flash_step);
    }

    fn fallback(&mut self, ctx: &mut DisplayContext, credentials: &WifiConfig) -> ConnectionState {
        log::warn!("No Wi-Fi, starting fallback animation");
        let mut animator = Animator::new(self.animation, ctx.strip_len());

        let Some(interval) = self.config.reconnect_interval else {
            animator.run(ctx, self.clock, &self.cancel);
            return self.state;
        };

        loop {
            let deadline = self.clock.now() + interval;
            if animator.run_until(ctx, self.clock, deadline, &self.cancel) == AnimationExit::Cancelled
            {
                return self.state;
            }

            if self.try_associate(ctx, credentials) == ConnectionState::Connected {
                return self.state;
            }
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            log::debug!("{:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }
}

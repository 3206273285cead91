//! The "alive but disconnected" animation.
//!
//! A triangle of hue sweeps back and forth along the strip, blending from
//! `hue_start` at rest to `hue_end` at the peak.

use std::time::Duration;

use crate::app::display::{DisplayContext, Frame};
use crate::color::hsv_to_rgb;
use crate::svc::{CancelToken, Clock, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationConfig {
    /// Degrees.
    pub hue_start: f32,
    /// Degrees.
    pub hue_end: f32,
    /// Pixels per frame.
    pub speed: f32,
    pub saturation: f32,
    pub value: f32,
    pub frame_interval: Duration,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            hue_start: 30.0,
            hue_end: 140.0,
            speed: 0.3,
            saturation: 1.0,
            value: 0.8,
            frame_interval: Duration::from_millis(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimatorState {
    pub distance: f32,
    /// `+speed` or `-speed`.
    pub direction: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationExit {
    Cancelled,
    DeadlineReached,
}

pub struct Animator {
    config: AnimationConfig,
    strip_len: usize,
    state: AnimatorState,
}

impl Animator {
    pub fn new(config: AnimationConfig, strip_len: usize) -> Self {
        let state = AnimatorState {
            distance: 0.0,
            direction: config.speed,
        };
        Self::with_state(config, strip_len, state)
    }

    pub fn with_state(config: AnimationConfig, strip_len: usize, state: AnimatorState) -> Self {
        Self {
            config,
            strip_len,
            state,
        }
    }

    pub fn state(&self) -> AnimatorState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = AnimatorState {
            distance: 0.0,
            direction: self.config.speed,
        };
    }

    /// Computes the frame for the current position, then moves on.
    pub fn next_frame(&mut self) -> Frame {
        let AnimationConfig {
            hue_start,
            hue_end,
            saturation,
            value,
            ..
        } = self.config;
        let width = self.strip_len as f32 / 3.0;
        let distance = self.state.distance;

        let frame = Frame::from_fn(self.strip_len, |i| {
            let j = (1.0 - (distance - i as f32).abs() / width).max(0.0);
            let hue = hue_start + j * (hue_end - hue_start);
            hsv_to_rgb(hue / 360.0, saturation, value)
        });

        self.advance();
        frame
    }

    // Reflect at both ends so the wave turns around instead of jumping.
    fn advance(&mut self) {
        let speed = self.config.speed;
        self.state.distance += self.state.direction;
        if self.state.distance > self.strip_len as f32 {
            self.state.direction = -speed;
        }
        if self.state.distance < 0.0 {
            self.state.direction = speed;
        }
    }

    /// Animates until `cancel` fires.
    pub fn run(&mut self, ctx: &mut DisplayContext, clock: &dyn Clock, cancel: &CancelToken) {
        log::info!("Fallback animation started");
        while !cancel.is_cancelled() {
            self.step(ctx, clock);
        }
        log::info!("Fallback animation cancelled");
    }

    /// Animates until `cancel` fires or the clock reaches `deadline`.
    pub fn run_until(
        &mut self,
        ctx: &mut DisplayContext,
        clock: &dyn Clock,
        deadline: Timestamp,
        cancel: &CancelToken,
    ) -> AnimationExit {
        log::info!("Fallback animation started, running until {deadline}");
        loop {
            if cancel.is_cancelled() {
                log::info!("Fallback animation cancelled");
                return AnimationExit::Cancelled;
            }
            if clock.now() >= deadline {
                return AnimationExit::DeadlineReached;
            }
            self.step(ctx, clock);
        }
    }

    fn step(&mut self, ctx: &mut DisplayContext, clock: &dyn Clock) {
        let frame = self.next_frame();
        ctx.render(&frame);
        clock.sleep(self.config.frame_interval);
    }
}

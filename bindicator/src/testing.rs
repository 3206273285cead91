//! Test doubles for the platform traits.
//!
//! Time only moves when something sleeps on the [`ManualClock`], so every
//! scenario runs instantly and deterministically.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use anyhow::anyhow;

use crate::color::Rgb;
use crate::hal::led_strip::LedStrip;
use crate::hal::status_led::StatusLed;
use crate::hal::wifi::{Wifi, WifiConfig};
use crate::hal::Platform;
use crate::svc::{Clock, HttpClient, HttpResponse, TimeSync, Timestamp};

pub const T0: Timestamp = Timestamp::from_secs(1_700_000_000);

pub struct ManualClock {
    now: Cell<Timestamp>,
    sleeps: RefCell<Vec<Duration>>,
}

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Cell::new(now),
            sleeps: RefCell::new(Vec::new()),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
        self.now.set(self.now.get() + duration);
    }
}

pub struct RecordingStrip {
    clock: Rc<ManualClock>,
    pixels: RefCell<Vec<Rgb>>,
    frames: RefCell<Vec<(Timestamp, Vec<Rgb>)>>,
    pub refreshing: Cell<bool>,
}

impl RecordingStrip {
    pub fn new(clock: Rc<ManualClock>, len: usize) -> Self {
        Self {
            clock,
            pixels: RefCell::new(vec![Rgb::BLACK; len]),
            frames: RefCell::new(Vec::new()),
            refreshing: Cell::new(false),
        }
    }

    pub fn pixels(&self) -> Vec<Rgb> {
        self.pixels.borrow().clone()
    }

    pub fn frames(&self) -> Vec<(Timestamp, Vec<Rgb>)> {
        self.frames.borrow().clone()
    }

    /// Whole frames that were a single color, with the time they were shown.
    pub fn fills(&self) -> Vec<(Timestamp, Rgb)> {
        self.frames
            .borrow()
            .iter()
            .filter_map(|(t, pixels)| {
                let first = *pixels.first()?;
                pixels.iter().all(|p| *p == first).then_some((*t, first))
            })
            .collect()
    }
}

impl LedStrip for RecordingStrip {
    fn len(&self) -> usize {
        self.pixels.borrow().len()
    }

    fn set_pixel(&self, index: usize, color: Rgb) {
        if let Some(pixel) = self.pixels.borrow_mut().get_mut(index) {
            *pixel = color;
        }
    }

    fn set_pixels(&self, pixels: &[Rgb]) {
        for (index, color) in pixels.iter().enumerate() {
            self.set_pixel(index, *color);
        }
        self.frames
            .borrow_mut()
            .push((self.clock.now(), pixels.to_vec()));
    }

    fn begin_continuous_refresh(&self) -> anyhow::Result<()> {
        self.refreshing.set(true);
        Ok(())
    }
}

pub struct RecordingStatusLed {
    clock: Rc<ManualClock>,
    events: RefCell<Vec<(Timestamp, bool)>>,
}

impl RecordingStatusLed {
    pub fn events(&self) -> Vec<(Timestamp, bool)> {
        self.events.borrow().clone()
    }
}

impl StatusLed for RecordingStatusLed {
    fn set(&self, on: bool) {
        self.events.borrow_mut().push((self.clock.now(), on));
    }
}

#[derive(Default)]
pub struct ScriptedHttp {
    responses: RefCell<VecDeque<anyhow::Result<HttpResponse>>>,
    requests: RefCell<Vec<(String, Vec<(String, String)>)>>,
}

impl ScriptedHttp {
    pub fn push_ok(&self, body: &str) {
        self.push(Ok(HttpResponse {
            status: 200,
            body: body.as_bytes().to_vec(),
        }));
    }

    pub fn push_status(&self, status: u16) {
        self.push(Ok(HttpResponse {
            status,
            body: Vec::new(),
        }));
    }

    pub fn push_transport_error(&self) {
        self.push(Err(anyhow!("connection reset")));
    }

    pub fn push(&self, response: anyhow::Result<HttpResponse>) {
        self.responses.borrow_mut().push_back(response);
    }

    pub fn requests(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.requests.borrow().clone()
    }
}

impl HttpClient for ScriptedHttp {
    fn get(&self, url: &str, headers: &[(&str, &str)]) -> anyhow::Result<HttpResponse> {
        let headers = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.requests.borrow_mut().push((url.to_owned(), headers));
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("no scripted response")))
    }
}

/// Connects once the clock reaches `connects_at`; never connects when `None`.
pub struct ScriptedWifi {
    clock: Rc<ManualClock>,
    pub connects_at: Cell<Option<Timestamp>>,
    pub fail_setup: Cell<bool>,
    pub setups: Cell<u32>,
}

impl Wifi for ScriptedWifi {
    fn setup(&self, _config: &WifiConfig) -> anyhow::Result<()> {
        self.setups.set(self.setups.get() + 1);
        if self.fail_setup.get() {
            Err(anyhow!("radio unavailable"))
        } else {
            Ok(())
        }
    }

    fn is_connected(&self) -> bool {
        self.connects_at
            .get()
            .is_some_and(|t| self.clock.now() >= t)
    }
}

#[derive(Default)]
pub struct ScriptedTimeSync {
    pub fail: Cell<bool>,
    pub calls: Cell<u32>,
}

impl TimeSync for ScriptedTimeSync {
    fn sync(&self) -> anyhow::Result<()> {
        self.calls.set(self.calls.get() + 1);
        if self.fail.get() {
            Err(anyhow!("no reply from pool.ntp.org"))
        } else {
            Ok(())
        }
    }
}

pub struct MockPlatform {
    pub clock: Rc<ManualClock>,
    pub strip: RecordingStrip,
    pub status_led: RecordingStatusLed,
    pub http: ScriptedHttp,
    pub wifi: ScriptedWifi,
    pub time_sync: ScriptedTimeSync,
}

impl MockPlatform {
    pub fn new(strip_len: usize) -> Self {
        let clock = Rc::new(ManualClock::new(T0));
        Self {
            strip: RecordingStrip::new(clock.clone(), strip_len),
            status_led: RecordingStatusLed {
                clock: clock.clone(),
                events: RefCell::new(Vec::new()),
            },
            http: ScriptedHttp::default(),
            wifi: ScriptedWifi {
                clock: clock.clone(),
                connects_at: Cell::new(Some(T0)),
                fail_setup: Cell::new(false),
                setups: Cell::new(0),
            },
            time_sync: ScriptedTimeSync::default(),
            clock,
        }
    }
}

impl Platform for MockPlatform {
    fn clock(&self) -> &(dyn Clock + '_) {
        self.clock.as_ref()
    }

    fn http_client(&self) -> &(dyn HttpClient + '_) {
        &self.http
    }

    fn led_strip(&self) -> &(dyn LedStrip + '_) {
        &self.strip
    }

    fn status_led(&self) -> &(dyn StatusLed + '_) {
        &self.status_led
    }

    fn time_sync(&self) -> &(dyn TimeSync + '_) {
        &self.time_sync
    }

    fn wifi(&self) -> &(dyn Wifi + '_) {
        &self.wifi
    }
}

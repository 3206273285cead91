use anyhow::anyhow;
use bindicator::hal::led_strip::LedStrip;
use bindicator::hal::status_led::StatusLed;
use bindicator::hal::wifi::Wifi;
use bindicator::hal::Platform;
use bindicator::svc::{Clock, HttpClient, SystemClock, TimeSync};
use esp_idf_hal::gpio::OutputPin;
use esp_idf_hal::peripherals::Peripherals;

use crate::drivers::http::EspHttpClient;
use crate::drivers::led_strip::Ws2812Strip;
use crate::drivers::sntp::EspTimeSync;
use crate::drivers::status_led::EspStatusLed;
use crate::drivers::wifi::EspWifi;

const LED_STRIP_RMT_CHANNEL: u8 = 0;

pub enum BoardType {
    M5StampC3,
    RustDevKit,
}

impl BoardType {
    fn led_strip_gpio(&self) -> u32 {
        match self {
            BoardType::M5StampC3 => 1,
            BoardType::RustDevKit => 2,
        }
    }
}

pub struct Config {
    pub board_type: BoardType,
    pub strip_len: usize,
}

pub struct PlatformImpl {
    clock: SystemClock,
    http_client: EspHttpClient,
    led_strip: Ws2812Strip,
    status_led: EspStatusLed,
    time_sync: EspTimeSync,
    wifi: EspWifi,
}

impl PlatformImpl {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let peripherals = Peripherals::take().ok_or_else(|| anyhow!("Peripherals already taken"))?;

        let wifi = EspWifi::new(peripherals.modem)?;

        let status_led_pin = match config.board_type {
            BoardType::M5StampC3 => peripherals.pins.gpio3.downgrade_output(),
            BoardType::RustDevKit => peripherals.pins.gpio7.downgrade_output(),
        };
        let status_led = EspStatusLed::new(status_led_pin)?;

        let led_strip = Ws2812Strip::new(
            LED_STRIP_RMT_CHANNEL,
            config.board_type.led_strip_gpio(),
            config.strip_len,
        );

        let http_client = EspHttpClient::new()?;

        Ok(Self {
            clock: SystemClock,
            http_client,
            led_strip,
            status_led,
            time_sync: EspTimeSync::default(),
            wifi,
        })
    }
}

impl Platform for PlatformImpl {
    fn clock(&self) -> &(dyn Clock + '_) {
        &self.clock
    }

    fn http_client(&self) -> &(dyn HttpClient + '_) {
        &self.http_client
    }

    fn led_strip(&self) -> &(dyn LedStrip + '_) {
        &self.led_strip
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

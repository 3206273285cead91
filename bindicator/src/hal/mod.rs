use crate::hal::led_strip::LedStrip;
use crate::hal::status_led::StatusLed;
use crate::hal::wifi::Wifi;
use crate::svc::{Clock, HttpClient, TimeSync};

pub mod led_strip;
pub mod status_led;
pub mod wifi;

pub trait Platform {
    fn clock(&self) -> &(dyn Clock + '_);
    fn http_client(&self) -> &(dyn HttpClient + '_);
    fn led_strip(&self) -> &(dyn LedStrip + '_);
    fn status_led(&self) -> &(dyn StatusLed + '_);
    fn time_sync(&self) -> &(dyn TimeSync + '_);
    fn wifi(&self) -> &(dyn Wifi + '_);
}

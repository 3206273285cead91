pub mod http;
pub mod led_strip;
pub mod sntp;
pub mod status_led;
pub mod wifi;

use std::cell::RefCell;

use bindicator::hal::status_led::StatusLed;
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};

pub struct EspStatusLed {
    output: RefCell<PinDriver<'static, AnyOutputPin, Output>>,
}

impl EspStatusLed {
    pub fn new(pin: AnyOutputPin) -> anyhow::Result<EspStatusLed> {
        let mut output = PinDriver::output(pin)?;
        output.set_low()?;
        Ok(Self {
            output: RefCell::new(output),
        })
    }
}

impl StatusLed for EspStatusLed {
    fn set(&self, on: bool) {
        let Ok(mut output) = self.output.try_borrow_mut() else {
            return;
        };

        let result = if on {
            output.set_high()
        } else {
            output.set_low()
        };

        if let Err(e) = result {
            log::error!("Cannot set status LED: {e}");
        }
    }
}

use crate::color::Rgb;
use crate::hal::led_strip::LedStrip;
use crate::hal::status_led::StatusLed;

/// One color per pixel of the strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame(Vec<Rgb>);

impl Frame {
    pub fn filled(len: usize, color: Rgb) -> Self {
        Self(vec![color; len])
    }

    pub fn from_fn(len: usize, f: impl FnMut(usize) -> Rgb) -> Self {
        Self((0..len).map(f).collect())
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The outputs a component renders to.
///
/// Only one component holds the context mutably at a time, which is what
/// keeps the supervisor, the fallback animation and the indicator from
/// writing over each other.
pub struct DisplayContext<'a> {
    strip: &'a dyn LedStrip,
    status_led: &'a dyn StatusLed,
}

impl<'a> DisplayContext<'a> {
    pub fn new(strip: &'a dyn LedStrip, status_led: &'a dyn StatusLed) -> Self {
        Self { strip, status_led }
    }

    pub fn strip_len(&self) -> usize {
        self.strip.len()
    }

    pub fn render(&mut self, frame: &Frame) {
        self.strip.set_pixels(frame.pixels());
    }

    pub fn fill(&mut self, color: Rgb) {
        self.render(&Frame::filled(self.strip_len(), color));
    }

    pub fn set_pixel(&mut self, index: usize, color: Rgb) {
        self.strip.set_pixel(index, color);
    }

    pub fn set_status_led(&mut self, on: bool) {
        self.status_led.set(on);
    }
}

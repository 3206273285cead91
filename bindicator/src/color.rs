//! RGB and HSV colors.
//!
//! Hue, saturation and value are all normalized to `[0, 1]`. A hue of `1.0`
//! is the same color as `0.0`, so animations sweeping across the hue circle
//! never jump.

use palette::{FromColor, Hsv as PaletteHsv, Srgb};

#[derive(Default, Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<u32> for Rgb {
    fn from(x: u32) -> Self {
        Rgb {
            r: ((x & 0xFF0000) >> 16) as u8,
            g: ((x & 0x00FF00) >> 8) as u8,
            b: (x & 0x0000FF) as u8,
        }
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Rgb { r, g, b }
    }
}

#[derive(Default, Debug, Copy, Clone, PartialEq)]
pub struct Hsv {
    pub hue: f32,
    pub saturation: f32,
    pub value: f32,
}

impl Hsv {
    pub const fn new(hue: f32, saturation: f32, value: f32) -> Self {
        Self {
            hue,
            saturation,
            value,
        }
    }
}

impl From<Hsv> for Rgb {
    fn from(hsv: Hsv) -> Self {
        hsv_to_rgb(hsv.hue, hsv.saturation, hsv.value)
    }
}

impl From<Rgb> for Hsv {
    fn from(rgb: Rgb) -> Self {
        rgb_to_hsv(rgb)
    }
}

pub fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> Rgb {
    let hsv: PaletteHsv = PaletteHsv::new(
        hue.rem_euclid(1.0) * 360.0,
        saturation.clamp(0.0, 1.0),
        value.clamp(0.0, 1.0),
    );
    let rgb: Srgb = Srgb::from_color(hsv);
    let rgb: Srgb<u8> = rgb.into_format();
    Rgb::new(rgb.red, rgb.green, rgb.blue)
}

pub fn rgb_to_hsv(rgb: Rgb) -> Hsv {
    let srgb: Srgb<f32> = Srgb::new(rgb.r, rgb.g, rgb.b).into_format();
    let hsv: PaletteHsv = PaletteHsv::from_color(srgb);
    Hsv {
        hue: hsv.hue.into_positive_degrees() / 360.0,
        saturation: hsv.saturation,
        value: hsv.value,
    }
}

use crate::color::{hsv_to_rgb, Rgb};

/// An addressable strip of RGB pixels.
///
/// Implementations own their refresh cadence once
/// [`begin_continuous_refresh`](LedStrip::begin_continuous_refresh) has been
/// called; callers only write pixels.
pub trait LedStrip {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Out of range indices are ignored.
    fn set_pixel(&self, index: usize, color: Rgb);

    /// Writes `pixels` starting at index 0.
    fn set_pixels(&self, pixels: &[Rgb]) {
        for (index, color) in pixels.iter().enumerate() {
            self.set_pixel(index, *color);
        }
    }

    fn set_pixel_hsv(&self, index: usize, hue: f32, saturation: f32, value: f32) {
        self.set_pixel(index, hsv_to_rgb(hue, saturation, value));
    }

    fn begin_continuous_refresh(&self) -> anyhow::Result<()>;
}

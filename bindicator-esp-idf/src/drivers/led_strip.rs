use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{sleep, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, bail};
use bindicator::color::Rgb;
use bindicator::hal::led_strip::LedStrip;
use smart_leds::{SmartLedsWrite, RGB8};
use ws2812_esp32_rmt_driver::Ws2812Esp32Rmt;

const REFRESH_PERIOD: Duration = Duration::from_millis(20);

type SharedPixels = Arc<Mutex<Vec<RGB8>>>;

/// WS2812 strip driven over RMT.
///
/// Writes only touch the shared buffer. A background thread pushes the
/// buffer to the strip every [`REFRESH_PERIOD`].
pub struct Ws2812Strip {
    channel: u8,
    gpio: u32,
    len: usize,
    pixels: SharedPixels,
    continue_running: Arc<AtomicBool>,
    thread: RefCell<Option<JoinHandle<()>>>,
}

impl Ws2812Strip {
    pub fn new(channel: u8, gpio: u32, len: usize) -> Self {
        Self {
            channel,
            gpio,
            len,
            pixels: Arc::new(Mutex::new(vec![RGB8::default(); len])),
            continue_running: Arc::new(AtomicBool::new(true)),
            thread: RefCell::new(None),
        }
    }
}

impl LedStrip for Ws2812Strip {
    fn len(&self) -> usize {
        self.len
    }

    fn set_pixel(&self, index: usize, color: Rgb) {
        if let Ok(mut pixels) = self.pixels.lock() {
            if let Some(pixel) = pixels.get_mut(index) {
                *pixel = RGB8::new(color.r, color.g, color.b);
            }
        }
    }

    fn set_pixels(&self, colors: &[Rgb]) {
        if let Ok(mut pixels) = self.pixels.lock() {
            for (pixel, color) in pixels.iter_mut().zip(colors) {
                *pixel = RGB8::new(color.r, color.g, color.b);
            }
        }
    }

    fn begin_continuous_refresh(&self) -> anyhow::Result<()> {
        let mut thread = self.thread.try_borrow_mut()?;
        if thread.is_some() {
            bail!("LED strip refresh already running");
        }

        log::info!(
            "Starting LED strip refresh, {} pixels on GPIO{}",
            self.len,
            self.gpio
        );

        *thread = Some(spawn_thread(
            self.channel,
            self.gpio,
            self.pixels.clone(),
            self.continue_running.clone(),
        )?);

        Ok(())
    }
}

impl Drop for Ws2812Strip {
    fn drop(&mut self) {
        self.continue_running.store(false, Ordering::Relaxed);
        if let Some(thread) = self.thread.get_mut().take() {
            if thread.join().is_err() {
                log::error!("LED strip refresh thread panicked");
            }
        }
    }
}

fn spawn_thread(
    channel: u8,
    gpio: u32,
    pixels: SharedPixels,
    continue_running: Arc<AtomicBool>,
) -> anyhow::Result<JoinHandle<()>> {
    let thread = std::thread::Builder::new()
        .name("led_strip".to_owned())
        .spawn(move || {
            let mut driver = match Ws2812Esp32Rmt::new(channel, gpio) {
                Ok(driver) => driver,
                Err(e) => {
                    log::error!("Cannot create WS2812 driver: {e:?}");
                    return;
                }
            };

            let mut frame = Vec::new();

            while continue_running.load(Ordering::Relaxed) {
                if let Ok(pixels) = pixels.lock() {
                    frame.clone_from(&pixels);
                }

                if let Err(e) = driver.write(frame.iter().copied()) {
                    log::error!("Cannot write LED strip: {e:?}");
                }

                sleep(REFRESH_PERIOD);
            }
        })
        .map_err(|e| anyhow!("Cannot spawn LED strip thread: {e}"))?;

    Ok(thread)
}

//! Pulsing full-screen color: ramp brightness down to zero, then pick a new
//! random color and start over.
//!
//! Runs against the simulated backend so it works anywhere; swap the backend
//! for `PinBackend` on real hardware.

use std::thread;
use std::time::Duration;

use hub75_matrix::sim::SimBackend;
use hub75_matrix::{Color, LedMatrix, MatrixOptions};

/// xorshift64*, plenty for picking colors.
struct Rng(u64);

impl Rng {
    fn next_byte(&mut self) -> u8 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0.wrapping_mul(0x2545_f491_4f6c_dd1d) >> 56) as u8
    }

    fn color(&mut self) -> Color {
        Color::new(self.next_byte(), self.next_byte(), self.next_byte())
    }
}

fn main() -> Result<(), hub75_matrix::Error> {
    env_logger::init();

    let options = MatrixOptions {
        rows: 64,
        cols: 64,
        chain_length: 4,
        parallel: 1,
        hardware_mapping: Some("adafruit-hat".into()),
        gpio_slowdown: 2,
        limit_refresh_rate_hz: 120,
        brightness: 50,
        disable_hardware_pulsing: true,
        ..MatrixOptions::default()
    };
    let matrix = LedMatrix::new(SimBackend::default(), options)?;
    let mut canvas = matrix.offscreen_canvas();

    let max_brightness = matrix.brightness();
    let mut rng = Rng(0x9e37_79b9_7f4a_7c15);
    let mut color = rng.color();
    for _ in 0..(max_brightness as u32 * 4) {
        if matrix.brightness() < 1 {
            matrix.set_brightness(max_brightness);
            color = rng.color();
        } else {
            matrix.set_brightness(matrix.brightness() - 1);
        }

        canvas.fill(color);
        canvas = matrix.swap_on_vsync(canvas);
        thread::sleep(Duration::from_millis(20));
    }
    Ok(())
}

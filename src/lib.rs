//! Driver for HUB75-style RGB LED matrix panels.
//!
//! Panels are driven by shifting color bits for one scan line at a time and
//! rapidly multiplexing over the scan lines; shades are produced with binary
//! code modulation over up to 11 bit-planes. All of that runs on a dedicated
//! refresh thread, while the caller draws into offscreen [`Canvas`] buffers
//! and hands them over with [`LedMatrix::swap_on_vsync`].
//!
//! The electrical side is behind the [`gpio::GpioBackend`] trait:
//! [`gpio::PinBackend`] bit-bangs `embedded-hal` output pins, and
//! [`sim::SimBackend`] records the signal trace for tests.
//!
//! ```no_run
//! use hub75_matrix::{LedMatrix, MatrixOptions, Color};
//! use hub75_matrix::sim::SimBackend;
//!
//! let options = MatrixOptions {
//!     rows: 64,
//!     cols: 64,
//!     chain_length: 2,
//!     ..MatrixOptions::default()
//! };
//! let matrix = LedMatrix::new(SimBackend::default(), options)?;
//! let mut canvas = matrix.offscreen_canvas();
//! canvas.fill(Color::new(0, 0, 128));
//! let _recycled = matrix.swap_on_vsync(canvas);
//! # Ok::<(), hub75_matrix::Error>(())
//! ```

pub use embedded_graphics::pixelcolor::Rgb888;

/// The color type used throughout, 8 bits per channel.
pub type Color = Rgb888;

mod bcm;
pub mod canvas;
pub mod error;
pub mod font;
pub mod gpio;
mod mapper;
pub mod matrix;
pub mod options;
mod panel;
pub mod sim;

pub use canvas::Canvas;
pub use error::Error;
pub use font::Font;
pub use matrix::{LedMatrix, LiveCanvas};
pub use options::{MatrixOptions, Multiplexing, ScanMode};

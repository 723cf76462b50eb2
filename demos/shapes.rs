//! Static shapes: crossing lines, concentric circles and an
//! `embedded-graphics` rectangle, drawn once and left on screen.

use std::thread;
use std::time::Duration;

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

use hub75_matrix::sim::SimBackend;
use hub75_matrix::{Color, LedMatrix, MatrixOptions};

fn main() -> Result<(), hub75_matrix::Error> {
    env_logger::init();

    let options = MatrixOptions {
        rows: 64,
        cols: 64,
        ..MatrixOptions::default()
    };
    let matrix = LedMatrix::new(SimBackend::default(), options)?;
    let mut canvas = matrix.offscreen_canvas();

    let max_x = canvas.width() as i32 - 1;
    let max_y = canvas.height() as i32 - 1;
    let center = (max_x / 2, max_y / 2);

    canvas.draw_line(0, 0, max_x, max_y, Color::new(255, 0, 0));
    canvas.draw_line(max_x, 0, 0, max_y, Color::new(0, 255, 0));
    for radius in [8, 14, 20] {
        canvas.draw_circle(center.0, center.1, radius, Color::new(0, 0, 255));
    }
    Rectangle::new(Point::new(2, 2), Size::new(12, 8))
        .into_styled(PrimitiveStyle::with_stroke(Color::new(255, 255, 0), 1))
        .draw(&mut canvas)
        .unwrap();

    let _ = matrix.swap_on_vsync(canvas);
    thread::sleep(Duration::from_secs(2));
    Ok(())
}

//! Loading a BDF font from disk and rendering it through a canvas.

use std::path::PathBuf;

use hub75_matrix::sim::SimBackend;
use hub75_matrix::{Color, Error, Font, LedMatrix};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn loads_from_disk() {
    let font = Font::load(fixture("tiny4x6.bdf")).unwrap();
    assert_eq!(font.height(), 6);
    assert_eq!(font.baseline(), 5);
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        Font::load(fixture("no-such-font.bdf")),
        Err(Error::Io(_))
    ));
}

#[test]
fn renders_text_onto_a_canvas() {
    let font = Font::load(fixture("tiny4x6.bdf")).unwrap();
    let matrix = LedMatrix::with_geometry(SimBackend::default(), 32, 1, 1).unwrap();
    let mut canvas = matrix.offscreen_canvas();

    let white = Color::new(255, 255, 255);
    let advanced = canvas.draw_text(&font, 1, 6, white, "A I", 0, false);
    // 'A' and space advance 4 each, 'I' advances 2
    assert_eq!(advanced, 10);
    // apex of the 'A': BBX 3x5 at offset 0,0 puts the top row at y=1
    assert_eq!(canvas.pixel(2, 1), Some(white));
    // the 'I' stem sits after two 4-pixel advances
    assert_eq!(canvas.pixel(9, 3), Some(white));
    // nothing above the glyph tops
    assert_eq!(canvas.pixel(2, 0), Some(Color::new(0, 0, 0)));
}

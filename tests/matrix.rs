//! End-to-end tests over the simulated GPIO backend: the full controller
//! stack runs with a real refresh thread, and the backend's trace tells us
//! what reached the "panel".

use hub75_matrix::sim::SimBackend;
use hub75_matrix::{Color, Error, LedMatrix, MatrixOptions};

fn options_64x64_chain4() -> MatrixOptions {
    MatrixOptions {
        rows: 64,
        cols: 64,
        chain_length: 4,
        parallel: 1,
        ..MatrixOptions::default()
    }
}

#[test]
fn canvas_dimensions_follow_geometry() {
    let mut matrix = LedMatrix::new(SimBackend::default(), options_64x64_chain4()).unwrap();
    assert_eq!(matrix.width(), 256);
    assert_eq!(matrix.height(), 64);
    let canvas = matrix.offscreen_canvas();
    assert_eq!((canvas.width(), canvas.height()), (256, 64));
    matrix.shutdown();
}

#[test]
fn mapper_reshapes_canvas_dimensions() {
    let options = MatrixOptions {
        pixel_mapper_config: Some("U-mapper".into()),
        ..options_64x64_chain4()
    };
    let matrix = LedMatrix::new(SimBackend::default(), options).unwrap();
    // the 256x64 chain folds into a 128x128 square
    assert_eq!((matrix.width(), matrix.height()), (128, 128));
}

#[test]
fn invalid_geometry_rejected_before_hardware_claim() {
    let backend = SimBackend::default();
    let probe = backend.probe();
    let result = LedMatrix::new(
        backend,
        MatrixOptions {
            rows: 7,
            ..MatrixOptions::default()
        },
    );
    assert!(matches!(result, Err(Error::Config(_))));
    probe.with(|trace| assert_eq!(trace.claims, 0));
}

#[test]
fn bad_rgb_sequence_is_a_config_error() {
    let result = LedMatrix::new(
        SimBackend::default(),
        MatrixOptions {
            led_rgb_sequence: Some("RGX".into()),
            ..MatrixOptions::default()
        },
    );
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn swap_returns_the_previously_displayed_buffer() {
    let matrix = LedMatrix::with_geometry(SimBackend::default(), 32, 1, 1).unwrap();

    let mut canvas = matrix.offscreen_canvas();
    canvas.fill(Color::new(200, 0, 0));
    // first swap returns the initial (black) display buffer
    let canvas = matrix.swap_on_vsync(canvas);
    assert_eq!(canvas.pixel(0, 0), Some(Color::new(0, 0, 0)));

    let mut canvas = canvas;
    canvas.fill(Color::new(0, 200, 0));
    // second swap recycles the red frame from the first
    let canvas = matrix.swap_on_vsync(canvas);
    assert_eq!(canvas.pixel(5, 5), Some(Color::new(200, 0, 0)));
    assert_eq!(canvas.pixel(31, 31), Some(Color::new(200, 0, 0)));
}

#[test]
fn refresh_walks_every_scan_address() {
    let backend = SimBackend::default();
    let probe = backend.probe();
    let matrix = LedMatrix::with_geometry(backend, 16, 1, 1).unwrap();

    let mut canvas = matrix.offscreen_canvas();
    canvas.fill(Color::new(255, 0, 0));
    let canvas = matrix.swap_on_vsync(canvas);
    // second swap guarantees at least one full cycle of the red frame
    let _ = matrix.swap_on_vsync(canvas);

    probe.with(|trace| {
        for addr in 0..8u8 {
            assert!(
                trace.address_counts.contains_key(&addr),
                "scan address {addr} never driven"
            );
        }
        assert!(trace.latches > 0);
        assert!(trace.shifts > 0);
    });
}

#[test]
fn red_reaches_the_red_line() {
    let backend = SimBackend::default();
    let probe = backend.probe();
    let matrix = LedMatrix::with_geometry(backend, 16, 1, 1).unwrap();

    let mut canvas = matrix.offscreen_canvas();
    canvas.fill(Color::new(255, 0, 0));
    let canvas = matrix.swap_on_vsync(canvas);
    let _ = matrix.swap_on_vsync(canvas);

    probe.with(|trace| {
        assert!(trace.pulses > 0);
        // full-red frame: every (address, column) of the first chain lit
        assert!(trace.red_on_time.values().all(|&ns| ns > 0));
        assert!(!trace.red_on_time.is_empty());
    });
}

#[test]
fn brightness_percent_maps_to_byte() {
    let matrix = LedMatrix::new(
        SimBackend::default(),
        MatrixOptions {
            brightness: 50,
            ..MatrixOptions::default()
        },
    )
    .unwrap();
    assert_eq!(matrix.brightness(), 127);
    matrix.set_brightness(200);
    assert_eq!(matrix.brightness(), 200);
    matrix.set_brightness(0);
    assert_eq!(matrix.brightness(), 0);
}

#[test]
fn zero_brightness_stops_pulsing() {
    let backend = SimBackend::default();
    let probe = backend.probe();
    let matrix = LedMatrix::with_geometry(backend, 16, 1, 1).unwrap();
    matrix.set_brightness(0);

    let canvas = matrix.swap_on_vsync(matrix.offscreen_canvas());
    let canvas = matrix.swap_on_vsync(canvas);
    let pulses_before = probe.with(|trace| trace.pulses);

    let canvas = matrix.swap_on_vsync(canvas);
    let _ = matrix.swap_on_vsync(canvas);
    let pulses_after = probe.with(|trace| trace.pulses);

    // every cycle after the brightness store sees zero on-time
    assert_eq!(pulses_before, pulses_after);
}

#[test]
fn live_canvas_reads_back_writes() {
    let matrix = LedMatrix::with_geometry(SimBackend::default(), 32, 1, 1).unwrap();
    let live = matrix.canvas();
    assert_eq!((live.width(), live.height()), (32, 32));

    live.set_pixel(3, 4, Color::new(10, 20, 30)).unwrap();
    assert_eq!(live.pixel(3, 4), Some(Color::new(10, 20, 30)));
    assert!(matches!(
        live.set_pixel(-1, 0, Color::new(1, 1, 1)),
        Err(Error::OutOfRange { .. })
    ));

    live.fill(Color::new(1, 2, 3));
    assert_eq!(live.pixel(31, 31), Some(Color::new(1, 2, 3)));
}

#[test]
fn shutdown_is_idempotent_and_releases_once() {
    let backend = SimBackend::default();
    let probe = backend.probe();
    let mut matrix = LedMatrix::with_geometry(backend, 32, 1, 1).unwrap();
    matrix.shutdown();
    matrix.shutdown();
    probe.with(|trace| {
        assert_eq!(trace.claims, 1);
        assert_eq!(trace.releases, 1);
    });
}

#[test]
fn drop_releases_the_backend() {
    let backend = SimBackend::default();
    let probe = backend.probe();
    {
        let _matrix = LedMatrix::with_geometry(backend, 32, 1, 1).unwrap();
    }
    probe.with(|trace| assert_eq!(trace.releases, 1));
}

#[test]
fn swap_after_shutdown_still_returns() {
    let mut matrix = LedMatrix::with_geometry(SimBackend::default(), 32, 1, 1).unwrap();
    matrix.shutdown();

    let mut canvas = matrix.offscreen_canvas();
    canvas.fill(Color::new(9, 9, 9));
    // committed inline because the refresh thread is gone
    let recycled = matrix.swap_on_vsync(canvas);
    assert_eq!(recycled.pixel(0, 0), Some(Color::new(0, 0, 0)));
    assert_eq!(matrix.canvas().pixel(0, 0), Some(Color::new(9, 9, 9)));
}

#[test]
fn fm6126a_panel_initializes_before_refresh() {
    let backend = SimBackend::default();
    let probe = backend.probe();
    let mut matrix = LedMatrix::new(
        backend,
        MatrixOptions {
            panel_type: Some("FM6126A".into()),
            ..MatrixOptions::default()
        },
    )
    .unwrap();
    matrix.shutdown();
    // two register words clocked across all 32 columns each
    probe.with(|trace| assert!(trace.shifts >= 64));
}

//! The matrix controller: composes the mapper chain, panel driver, BCM
//! scheduler and GPIO backend, and owns the background refresh thread.
//!
//! Two threads of control exist. The caller's thread draws into offscreen
//! canvases it exclusively owns; the refresh thread continuously drives the
//! active buffer to the panel at PWM cadence. The only handoff is
//! [`LedMatrix::swap_on_vsync`], committed at the refresh cycle boundary.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::bcm::Schedule;
use crate::canvas::{Canvas, FrameBuffer};
use crate::error::Error;
use crate::gpio::GpioBackend;
use crate::mapper::MapperChain;
use crate::options::MatrixOptions;
use crate::panel;
use crate::Color;

#[derive(Default)]
struct Pending {
    incoming: Option<FrameBuffer>,
    outgoing: Option<FrameBuffer>,
}

struct Shared {
    /// The display-facing buffer. The refresh thread re-renders its BCM
    /// schedule from this whenever `dirty` is set.
    active: Mutex<FrameBuffer>,
    dirty: AtomicBool,
    /// Swap handoff slot, paired with `vsync`.
    pending: Mutex<Pending>,
    vsync: Condvar,
    /// Raw brightness byte, consulted by the refresh loop on every slot.
    /// Atomic so reads and writes stay lock-free and sub-microsecond.
    brightness: AtomicU8,
    running: AtomicBool,
}

impl Shared {
    /// Commit a pending swap against the active buffer. Returns true if a
    /// swap was committed.
    fn commit_pending(&self) -> bool {
        let mut pending = self.pending.lock().unwrap();
        let Some(incoming) = pending.incoming.take() else {
            return false;
        };
        let mut active = self.active.lock().unwrap();
        let old = std::mem::replace(&mut *active, incoming);
        drop(active);
        pending.outgoing = Some(old);
        self.dirty.store(true, Ordering::Release);
        self.vsync.notify_all();
        true
    }
}

/// A RGB LED matrix.
///
/// Single instance per physical panel chain. Dropping it (or calling
/// [`shutdown`](Self::shutdown)) stops the refresh loop and releases the
/// backend; repeated shutdown is a no-op.
pub struct LedMatrix {
    shared: Arc<Shared>,
    handle: Option<thread::JoinHandle<()>>,
    width: usize,
    height: usize,
}

impl LedMatrix {
    /// Build a matrix from options and a GPIO backend.
    ///
    /// Fails with [`Error::Config`] before the backend is touched if the
    /// options are invalid, and with [`Error::Init`] if the backend refuses
    /// the hardware claim or the refresh thread cannot start.
    pub fn new<B: GpioBackend + 'static>(
        backend: B,
        options: MatrixOptions,
    ) -> Result<Self, Error> {
        Self::start(Box::new(backend), options)
    }

    /// Convenience constructor from the bare geometry triple, with default
    /// 32-column modules and default timing.
    pub fn with_geometry<B: GpioBackend + 'static>(
        backend: B,
        rows: usize,
        chained: usize,
        parallel: usize,
    ) -> Result<Self, Error> {
        Self::new(
            backend,
            MatrixOptions {
                rows,
                chain_length: chained,
                parallel,
                ..MatrixOptions::default()
            },
        )
    }

    fn start(mut backend: Box<dyn GpioBackend>, options: MatrixOptions) -> Result<Self, Error> {
        options.validate()?;
        let order = options.channel_order()?;
        let panel_type = panel::parse_panel(options.panel_type.as_deref())?;
        let chain = MapperChain::parse(
            options.pixel_mapper_config.as_deref(),
            options.matrix_width(),
            options.matrix_height(),
            options.chain_length,
            options.parallel,
        )?;
        let (width, height) = chain.size();

        backend.claim(&options)?;
        if let Some(panel_type) = panel_type {
            panel::init_sequence(backend.as_mut(), panel_type, options.matrix_width());
        }

        let brightness = (options.brightness as u16 * 255 / 100) as u8;
        let shared = Arc::new(Shared {
            active: Mutex::new(FrameBuffer::new(width, height)),
            dirty: AtomicBool::new(true),
            pending: Mutex::new(Pending::default()),
            vsync: Condvar::new(),
            brightness: AtomicU8::new(brightness),
            running: AtomicBool::new(true),
        });

        let engine = Engine {
            schedule: Schedule::empty(&options),
            backend,
            shared: Arc::clone(&shared),
            chain,
            order,
            options,
        };
        let handle = thread::Builder::new()
            .name("hub75-refresh".into())
            .spawn(move || engine.run())
            .map_err(|e| Error::Init(format!("cannot start refresh thread: {e}")))?;

        log::info!("matrix up: {width}x{height} visible");
        Ok(Self {
            shared,
            handle: Some(handle),
            width,
            height,
        })
    }

    /// Visible width after pixel mapping.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Visible height after pixel mapping.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Create a new backbuffer canvas for drawing on.
    pub fn offscreen_canvas(&self) -> Canvas {
        Canvas::from_frame(FrameBuffer::new(self.width, self.height))
    }

    /// A live handle onto the currently displayed buffer.
    ///
    /// Writing through it shows up on the panel immediately and without any
    /// tearing guarantee; prefer [`offscreen_canvas`](Self::offscreen_canvas)
    /// plus [`swap_on_vsync`](Self::swap_on_vsync).
    pub fn canvas(&self) -> LiveCanvas {
        LiveCanvas {
            shared: Arc::clone(&self.shared),
            width: self.width,
            height: self.height,
        }
    }

    /// Exchange `canvas` with the currently displayed buffer at the next
    /// vertical-sync boundary and return the previous buffer for reuse.
    ///
    /// Blocks until the refresh thread commits the swap; this is the only
    /// blocking operation in the system, and it always eventually returns,
    /// including across shutdown.
    pub fn swap_on_vsync(&self, canvas: Canvas) -> Canvas {
        let shared = &self.shared;
        let mut pending = shared.pending.lock().unwrap();
        // one swap in flight at a time
        while pending.incoming.is_some() || pending.outgoing.is_some() {
            pending = shared.vsync.wait(pending).unwrap();
        }
        pending.incoming = Some(canvas.into_frame());
        loop {
            if let Some(frame) = pending.outgoing.take() {
                shared.vsync.notify_all();
                return Canvas::from_frame(frame);
            }
            if !shared.running.load(Ordering::Acquire) {
                // refresh thread is gone; commit the swap inline
                if let Some(incoming) = pending.incoming.take() {
                    let mut active = shared.active.lock().unwrap();
                    let old = std::mem::replace(&mut *active, incoming);
                    drop(active);
                    shared.dirty.store(true, Ordering::Release);
                    shared.vsync.notify_all();
                    return Canvas::from_frame(old);
                }
            }
            let (guard, _) = shared
                .vsync
                .wait_timeout(pending, Duration::from_millis(50))
                .unwrap();
            pending = guard;
        }
    }

    /// The current brightness as a raw byte.
    pub fn brightness(&self) -> u8 {
        self.shared.brightness.load(Ordering::Relaxed)
    }

    /// Set the brightness as a raw byte, effective from the next bit-plane.
    pub fn set_brightness(&self, brightness: u8) {
        self.shared.brightness.store(brightness, Ordering::Relaxed);
    }

    /// Stop the refresh loop and release the backend. Idempotent; also runs
    /// on drop.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.shared.running.store(false, Ordering::Release);
        self.shared.vsync.notify_all();
        if handle.join().is_err() {
            log::error!("refresh thread panicked during shutdown");
        }
        log::info!("matrix shut down");
    }
}

impl Drop for LedMatrix {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Unsynchronized handle onto the displayed buffer; see
/// [`LedMatrix::canvas`].
pub struct LiveCanvas {
    shared: Arc<Shared>,
    width: usize,
    height: usize,
}

impl LiveCanvas {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut FrameBuffer) -> R) -> R {
        let mut active = self.shared.active.lock().unwrap();
        let result = f(&mut active);
        self.shared.dirty.store(true, Ordering::Release);
        result
    }

    pub fn set_pixel(&self, x: i32, y: i32, color: Color) -> Result<(), Error> {
        self.mutate(|frame| frame.set_pixel(x, y, color))
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.shared.active.lock().unwrap().pixel(x, y)
    }

    pub fn set_pixels(
        &self,
        x: i32,
        y: i32,
        width: usize,
        height: usize,
        colors: &[Color],
    ) -> Result<(), Error> {
        self.mutate(|frame| frame.set_pixels(x, y, width, height, colors))
    }

    pub fn fill(&self, color: Color) {
        self.mutate(|frame| frame.fill(color));
    }

    pub fn clear(&self) {
        self.mutate(|frame| frame.clear());
    }

    pub fn draw_line(&self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        self.mutate(|frame| frame.draw_line(x0, y0, x1, y1, color));
    }

    pub fn draw_circle(&self, x: i32, y: i32, radius: i32, color: Color) {
        self.mutate(|frame| frame.draw_circle(x, y, radius, color));
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_text(
        &self,
        font: &crate::font::Font,
        x: i32,
        y: i32,
        color: Color,
        text: &str,
        spacing: i32,
        vertical: bool,
    ) -> i32 {
        self.mutate(|frame| frame.draw_text(font, x, y, color, text, spacing, vertical))
    }
}

struct Engine {
    backend: Box<dyn GpioBackend>,
    shared: Arc<Shared>,
    options: MatrixOptions,
    chain: MapperChain,
    order: [usize; 3],
    schedule: Schedule,
}

impl Engine {
    fn run(mut self) {
        let frame_budget = if self.options.limit_refresh_rate_hz > 0 {
            Some(Duration::from_nanos(
                1_000_000_000 / self.options.limit_refresh_rate_hz as u64,
            ))
        } else {
            None
        };
        let mut cycle: u64 = 0;
        let mut report_cycles: u64 = 0;
        let mut report_start = Instant::now();

        self.backend.blank(true);
        while self.shared.running.load(Ordering::Acquire) {
            let started = Instant::now();
            if self.shared.dirty.swap(false, Ordering::AcqRel) {
                let active = self.shared.active.lock().unwrap();
                self.schedule
                    .render(&active, &self.options, &self.chain, self.order);
            }
            self.drive_cycle(cycle);
            cycle = cycle.wrapping_add(1);

            // vertical-sync boundary: commit any pending swap
            self.shared.commit_pending();

            if let Some(budget) = frame_budget {
                let elapsed = started.elapsed();
                if elapsed < budget {
                    spin_sleep(budget - elapsed);
                }
            }

            report_cycles += 1;
            if self.options.show_refresh_rate && report_start.elapsed() >= Duration::from_secs(1)
            {
                let hz = report_cycles as f64 / report_start.elapsed().as_secs_f64();
                log::info!("refresh rate: {hz:.1} Hz");
                report_cycles = 0;
                report_start = Instant::now();
            }
        }

        // drain a possibly in-flight swap so no caller blocks forever
        self.shared.commit_pending();
        self.shared.vsync.notify_all();
        self.backend.blank(true);
        self.backend.release();
    }

    fn drive_cycle(&mut self, cycle: u64) {
        let brightness = self.shared.brightness.load(Ordering::Relaxed);
        for slot in &self.schedule.slots {
            if !self.schedule.slot_active(slot, cycle) {
                continue;
            }
            for word in &slot.words {
                self.backend.shift(*word);
            }
            self.backend.blank(true);
            self.backend.set_address(slot.addr);
            self.backend.set_latch(true);
            self.backend.set_latch(false);

            let ns = self.schedule.slot_nanos(slot, brightness);
            if ns == 0 {
                continue;
            }
            if !self.options.disable_hardware_pulsing && self.backend.hardware_pulse(ns) {
                continue;
            }
            self.backend.blank(false);
            spin_sleep(Duration::from_nanos(ns));
            self.backend.blank(true);
        }
    }
}

/// Sleep with sub-microsecond resolution: coarse `thread::sleep` for the
/// bulk, then spin out the remainder.
fn spin_sleep(duration: Duration) {
    let deadline = Instant::now() + duration;
    if duration > Duration::from_micros(200) {
        thread::sleep(duration - Duration::from_micros(100));
    }
    while Instant::now() < deadline {
        std::hint::spin_loop();
    }
}
